//! DynamoDB-backed todo table.
//!
//! Table key is `userId` (partition) + `todoId` (sort); listing goes through a
//! secondary index keyed by `userId`.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use super::models::{TodoItem, UpdateTodoRequest};
use super::repository::{StoreError, TodoRepository};

const ATTR_USER_ID: &str = "userId";
const ATTR_TODO_ID: &str = "todoId";
const ATTR_CREATED_AT: &str = "createdAt";
const ATTR_NAME: &str = "name";
const ATTR_DUE_DATE: &str = "dueDate";
const ATTR_DONE: &str = "done";
const ATTR_ATTACHMENT_URL: &str = "attachmentUrl";

/// DynamoDB table configuration
#[derive(Debug, Clone)]
pub struct DynamoTodoConfig {
    pub table_name: String,
    pub index_name: String,
    /// AWS region (optional, uses SDK default if not specified)
    pub region: Option<String>,
    /// Optional endpoint override (local DynamoDB)
    pub endpoint: Option<String>,
}

#[derive(Clone)]
pub struct DynamoTodoRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl std::fmt::Debug for DynamoTodoRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoTodoRepository")
            .field("table_name", &self.table_name)
            .field("index_name", &self.index_name)
            .finish()
    }
}

impl DynamoTodoRepository {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: DynamoTodoConfig) -> Self {
        // Inherit credentials, retry and HTTP settings from the shared SdkConfig
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(region) = config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region));
        }
        if let Some(endpoint) = config.endpoint {
            tracing::info!("Using DynamoDB endpoint {}", endpoint);
            builder = builder.endpoint_url(endpoint);
        }

        Self::from_client(Client::from_conf(builder.build()), config.table_name, config.index_name)
    }

    /// Create from a pre-built client
    pub fn from_client(client: Client, table_name: String, index_name: String) -> Self {
        Self {
            client,
            table_name,
            index_name,
        }
    }

    fn key(user_id: &str, todo_id: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (ATTR_USER_ID.to_string(), AttributeValue::S(user_id.to_string())),
            (ATTR_TODO_ID.to_string(), AttributeValue::S(todo_id.to_string())),
        ])
    }

    fn is_conditional_check_failed(err: &SdkError<UpdateItemError>) -> bool {
        match err {
            SdkError::ServiceError(service_err) => {
                matches!(service_err.err(), UpdateItemError::ConditionalCheckFailedException(_))
            }
            _ => false,
        }
    }
}

fn unavailable<E>(op: &str, err: E) -> StoreError
where
    E: std::error::Error,
{
    StoreError::Unavailable(format!("DynamoDB {} failed: {}", op, DisplayErrorContext(err)))
}

pub(crate) fn todo_to_item(todo: &TodoItem) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::from([
        (ATTR_USER_ID.to_string(), AttributeValue::S(todo.user_id.clone())),
        (ATTR_TODO_ID.to_string(), AttributeValue::S(todo.todo_id.clone())),
        (ATTR_CREATED_AT.to_string(), AttributeValue::S(todo.created_at.clone())),
        (ATTR_NAME.to_string(), AttributeValue::S(todo.name.clone())),
        (ATTR_DONE.to_string(), AttributeValue::Bool(todo.done)),
        (ATTR_ATTACHMENT_URL.to_string(), AttributeValue::S(todo.attachment_url.clone())),
    ]);
    if let Some(due) = &todo.due_date {
        item.insert(ATTR_DUE_DATE.to_string(), AttributeValue::S(due.clone()));
    }
    item
}

pub(crate) fn item_to_todo(item: &HashMap<String, AttributeValue>) -> Result<TodoItem, StoreError> {
    let string = |attr: &str| -> Result<String, StoreError> {
        item.get(attr)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| StoreError::Corrupt(format!("missing string attribute {}", attr)))
    };

    Ok(TodoItem {
        user_id: string(ATTR_USER_ID)?,
        todo_id: string(ATTR_TODO_ID)?,
        created_at: string(ATTR_CREATED_AT)?,
        name: string(ATTR_NAME)?,
        due_date: item
            .get(ATTR_DUE_DATE)
            .and_then(|v| v.as_s().ok())
            .cloned(),
        done: item
            .get(ATTR_DONE)
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        attachment_url: string(ATTR_ATTACHMENT_URL)?,
    })
}

/// `SET` for the present fields, `REMOVE` for a cleared due date.
fn update_expression(update: &UpdateTodoRequest) -> String {
    if update.due_date.is_some() {
        "SET #name = :n, #dueDate = :due, #done = :d".to_string()
    } else {
        "SET #name = :n, #done = :d REMOVE #dueDate".to_string()
    }
}

#[async_trait]
impl TodoRepository for DynamoTodoRepository {
    async fn get(&self, user_id: &str, todo_id: &str) -> Result<Option<TodoItem>, StoreError> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, todo_id)))
            .send()
            .await
            .map_err(|e| unavailable("GetItem", e))?;

        response.item().map(item_to_todo).transpose()
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<TodoItem>, StoreError> {
        let mut todos = Vec::new();
        let mut last_evaluated_key = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.index_name)
                .key_condition_expression("#userId = :userId")
                .expression_attribute_names("#userId", ATTR_USER_ID)
                .expression_attribute_values(":userId", AttributeValue::S(user_id.to_string()));

            if let Some(key) = last_evaluated_key.take() {
                request = request.set_exclusive_start_key(Some(key));
            }

            let response = request.send().await.map_err(|e| unavailable("Query", e))?;

            for item in response.items() {
                todos.push(item_to_todo(item)?);
            }

            match response.last_evaluated_key() {
                Some(key) if !key.is_empty() => {
                    last_evaluated_key = Some(key.clone());
                }
                _ => break,
            }
        }

        tracing::debug!("Listed {} todos for user", todos.len());
        Ok(todos)
    }

    async fn insert(&self, todo: &TodoItem) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(todo_to_item(todo)))
            .send()
            .await
            .map_err(|e| unavailable("PutItem", e))?;
        Ok(())
    }

    async fn update_fields(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &UpdateTodoRequest,
    ) -> Result<(), StoreError> {
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, todo_id)))
            .update_expression(update_expression(update))
            // UpdateItem would otherwise upsert a partial record
            .condition_expression("attribute_exists(#todoId)")
            .expression_attribute_names("#todoId", ATTR_TODO_ID)
            .expression_attribute_names("#name", ATTR_NAME)
            .expression_attribute_names("#dueDate", ATTR_DUE_DATE)
            .expression_attribute_names("#done", ATTR_DONE)
            .expression_attribute_values(":n", AttributeValue::S(update.name.clone()))
            .expression_attribute_values(":d", AttributeValue::Bool(update.done));

        if let Some(due) = &update.due_date {
            request = request.expression_attribute_values(":due", AttributeValue::S(due.clone()));
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(e) if Self::is_conditional_check_failed(&e) => {
                // Deleted between the existence check and this write
                tracing::warn!("Update skipped, todo {} no longer exists", todo_id);
                Ok(())
            }
            Err(e) => Err(unavailable("UpdateItem", e)),
        }
    }

    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, todo_id)))
            .send()
            .await
            .map_err(|e| unavailable("DeleteItem", e))?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|e| unavailable("DescribeTable", e))?;
        Ok(())
    }
}
