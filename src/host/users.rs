// ! User-directory capability set
// !
// ! Module registers the host's tools, resources, and prompt against the
// ! external user store: direct creation, sampling-backed random creation,
// ! whole-collection and per-id reads, and a fake-user prompt template.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::core::error::{CapError, CapResult};
use crate::core::prompt::{Prompt, PromptHandler};
use crate::core::registry::Registry;
use crate::core::resource::{ResourceHandler, StaticResource, TemplateResource};
use crate::core::tool::{Tool, ToolHandler};
use crate::host::SamplingBridge;
use crate::protocol::messages::CreateMessageParams;
use crate::protocol::types::{
    CallToolResult, FieldType, GetPromptResult, InputSchema, PromptArgument, PromptInfo,
    PromptMessage, ResourceContents, ResourceInfo, ResourceTemplateInfo, ToolAnnotations,
    ToolInfo,
};
use crate::store::{NewUser, UserStore};
use crate::utils::text::strip_code_fence;

/// URI of the whole-collection resource
pub const ALL_USERS_URI: &str = "users://all";
/// URI template of the per-id profile resource
pub const USER_PROFILE_TEMPLATE: &str = "users://{id}/profile";

const RANDOM_USER_PROMPT: &str = "Generate fake user data. The user should have a realistic \
name, email, address, and phone number. Return this data as a JSON object with no other text \
or formatting. The JSON object should have the keys \"name\", \"email\", \"address\", and \
\"phone\".";

const RANDOM_USER_MAX_TOKENS: u32 = 1024;

/// Register the full user capability set on a registry.
///
/// Registration does not touch the generation backend, so a missing
/// credential never prevents startup; only the sampling-backed tool fails
/// at invocation time.
pub fn register_user_capabilities(
    registry: &mut Registry,
    store: Arc<UserStore>,
    sampling: Arc<dyn SamplingBridge>,
) -> CapResult<()> {
    registry.register_tool(Tool::new(
        ToolInfo {
            name: "create-user".to_string(),
            description: Some("Create a new user in the database".to_string()),
            input_schema: InputSchema::new()
                .required_field("name", FieldType::String, "Full name of the user")
                .required_field("email", FieldType::String, "Email address of the user")
                .required_field("address", FieldType::String, "Postal address of the user")
                .required_field("phone", FieldType::String, "Phone number of the user"),
            annotations: Some(
                ToolAnnotations::new()
                    .with_title("Create User")
                    .non_destructive()
                    .open_world(),
            ),
        },
        CreateUserTool {
            store: store.clone(),
        },
    ))?;

    registry.register_tool(Tool::new(
        ToolInfo {
            name: "create-random-user".to_string(),
            description: Some(
                "Create a random user with generated fake data".to_string(),
            ),
            input_schema: InputSchema::new(),
            annotations: Some(
                ToolAnnotations::new()
                    .with_title("Create Random User")
                    .non_destructive()
                    .open_world(),
            ),
        },
        CreateRandomUserTool {
            store: store.clone(),
            sampling,
        },
    ))?;

    registry.register_resource(StaticResource::new(
        ResourceInfo {
            uri: ALL_USERS_URI.to_string(),
            name: "users".to_string(),
            description: Some("All users in the database".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        AllUsersResource {
            store: store.clone(),
        },
    ))?;

    registry.register_template(TemplateResource::new(
        ResourceTemplateInfo {
            uri_template: USER_PROFILE_TEMPLATE.to_string(),
            name: "user-profile".to_string(),
            description: Some("A single user's profile, by id".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        UserProfileResource { store },
    ))?;

    registry.register_prompt(Prompt::new(
        PromptInfo {
            name: "generate-fake-user".to_string(),
            description: Some("Generate a fake user with a given name".to_string()),
            arguments: Some(vec![PromptArgument {
                name: "name".to_string(),
                description: Some("Name to give the fake user".to_string()),
                required: Some(true),
            }]),
        },
        GenerateFakeUserPrompt,
    ))?;

    Ok(())
}

/// Parse a generated user record, stripping an optional code fence first.
///
/// The fence stripping is a deliberate normalization step: backends wrap
/// JSON in Markdown fences often enough that parsing without it would fail
/// in practice.
pub fn parse_generated_user(text: &str) -> CapResult<NewUser> {
    let body = strip_code_fence(text);
    serde_json::from_str(body).map_err(|e| {
        CapError::generation(format!("generated text was not a valid user record: {e}"))
    })
}

struct CreateUserTool {
    store: Arc<UserStore>,
}

#[async_trait]
impl ToolHandler for CreateUserTool {
    async fn call(&self, arguments: HashMap<String, Value>) -> CapResult<CallToolResult> {
        // Field presence and types are guaranteed by schema validation
        let field = |name: &str| -> String {
            arguments
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let id = self
            .store
            .append(NewUser {
                name: field("name"),
                email: field("email"),
                address: field("address"),
                phone: field("phone"),
            })
            .await?;

        Ok(CallToolResult::success(format!(
            "User {id} created successfully"
        )))
    }
}

struct CreateRandomUserTool {
    store: Arc<UserStore>,
    sampling: Arc<dyn SamplingBridge>,
}

#[async_trait]
impl ToolHandler for CreateRandomUserTool {
    async fn call(&self, _arguments: HashMap<String, Value>) -> CapResult<CallToolResult> {
        let params = CreateMessageParams::from_prompt(RANDOM_USER_PROMPT, RANDOM_USER_MAX_TOKENS);
        let generated = self.sampling.create_message(params).await?;

        // Parse before any side effect: a malformed record must leave the
        // store untouched.
        let new_user = parse_generated_user(generated.content.as_text())?;
        let id = self.store.append(new_user).await?;

        Ok(CallToolResult::success(format!(
            "User {id} created successfully"
        )))
    }
}

struct AllUsersResource {
    store: Arc<UserStore>,
}

#[async_trait]
impl ResourceHandler for AllUsersResource {
    async fn read(
        &self,
        uri: &str,
        _params: &HashMap<String, String>,
    ) -> CapResult<Vec<ResourceContents>> {
        let records = self.store.list().await?;
        Ok(vec![ResourceContents::text(
            uri.to_string(),
            "application/json".to_string(),
            serde_json::to_string_pretty(&records)?,
        )])
    }
}

struct UserProfileResource {
    store: Arc<UserStore>,
}

#[async_trait]
impl ResourceHandler for UserProfileResource {
    async fn read(
        &self,
        uri: &str,
        params: &HashMap<String, String>,
    ) -> CapResult<Vec<ResourceContents>> {
        let raw_id = params.get("id").cloned().unwrap_or_default();

        // Absence is domain data: an unknown or non-numeric id reads as a
        // successful not-found payload, not a protocol error.
        let payload = match raw_id.parse::<u64>() {
            Ok(id) => match self.store.get(id).await? {
                Some(record) => serde_json::to_value(&record)?,
                None => json!({"error": format!("User {raw_id} not found")}),
            },
            Err(_) => json!({"error": format!("User {raw_id} not found")}),
        };

        Ok(vec![ResourceContents::text(
            uri.to_string(),
            "application/json".to_string(),
            serde_json::to_string_pretty(&payload)?,
        )])
    }
}

struct GenerateFakeUserPrompt;

#[async_trait]
impl PromptHandler for GenerateFakeUserPrompt {
    async fn render(&self, arguments: HashMap<String, String>) -> CapResult<GetPromptResult> {
        let name = arguments.get("name").cloned().unwrap_or_default();
        Ok(GetPromptResult {
            description: Some("Fake user generation request".to_string()),
            messages: vec![PromptMessage::user(format!(
                "Generate a fake user named {name}. The user should have a realistic email, \
                 address, and phone number."
            ))],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Invoker;
    use crate::protocol::types::{CreateMessageResult, Role, SamplingContent, StopReason};
    use tempfile::TempDir;

    const ADA_JSON: &str = r#"{"name":"Ada","email":"a@b.com","address":"1 Main","phone":"555"}"#;

    /// Stub backend returning a fixed reply, or failing when `reply` is None
    struct StubSampling {
        reply: Option<String>,
    }

    #[async_trait]
    impl SamplingBridge for StubSampling {
        async fn create_message(
            &self,
            _params: CreateMessageParams,
        ) -> CapResult<CreateMessageResult> {
            match &self.reply {
                Some(text) => Ok(CreateMessageResult {
                    role: Role::Assistant,
                    content: SamplingContent::text(text.clone()),
                    model: "stub-model".to_string(),
                    stop_reason: Some(StopReason::EndTurn),
                }),
                None => Err(CapError::generation("backend unavailable")),
            }
        }
    }

    fn setup(reply: Option<&str>) -> (TempDir, Arc<UserStore>, Invoker) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(UserStore::new(dir.path().join("users.json")));
        let mut registry = Registry::new();
        register_user_capabilities(
            &mut registry,
            store.clone(),
            Arc::new(StubSampling {
                reply: reply.map(String::from),
            }),
        )
        .unwrap();
        (dir, store, Invoker::new(Arc::new(registry)))
    }

    #[test]
    fn test_parse_generated_user_bare_and_fenced() {
        let bare = parse_generated_user(ADA_JSON).unwrap();
        assert_eq!(bare.name, "Ada");

        let fenced = parse_generated_user(&format!("```json\n{ADA_JSON}\n```")).unwrap();
        assert_eq!(fenced.email, "a@b.com");

        assert!(parse_generated_user("I cannot generate that.").is_err());
    }

    #[tokio::test]
    async fn test_create_user_appends_record() {
        let (_dir, store, invoker) = setup(None);

        let mut args = HashMap::new();
        args.insert("name".to_string(), json!("Grace"));
        args.insert("email".to_string(), json!("g@h.org"));
        args.insert("address".to_string(), json!("2 Side St"));
        args.insert("phone".to_string(), json!("556"));

        let result = invoker.call_tool("create-user", Some(args)).await.unwrap();
        assert!(!result.is_failure());
        assert_eq!(
            result.content[0].as_text(),
            Some("User 1 created successfully")
        );
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_user_missing_field_leaves_store_unchanged() {
        let (_dir, store, invoker) = setup(None);

        let mut args = HashMap::new();
        args.insert("name".to_string(), json!("Grace"));

        let result = invoker.call_tool("create-user", Some(args)).await.unwrap();
        assert!(result.is_failure());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_random_user_round_trip_with_fenced_reply() {
        let (_dir, store, invoker) = setup(Some(&format!("```\n{ADA_JSON}\n```")));

        let result = invoker
            .call_tool("create-random-user", None)
            .await
            .unwrap();
        assert!(!result.is_failure());
        assert_eq!(
            result.content[0].as_text(),
            Some("User 1 created successfully")
        );

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].name, "Ada");
        assert_eq!(records[0].phone, "555");
    }

    #[tokio::test]
    async fn test_random_user_id_is_previous_count_plus_one() {
        let (_dir, store, invoker) = setup(Some(ADA_JSON));
        store
            .append(NewUser {
                name: "Seed".to_string(),
                email: "s@e.ed".to_string(),
                address: "0 Zero".to_string(),
                phone: "000".to_string(),
            })
            .await
            .unwrap();

        let result = invoker
            .call_tool("create-random-user", None)
            .await
            .unwrap();
        assert_eq!(
            result.content[0].as_text(),
            Some("User 2 created successfully")
        );
    }

    #[tokio::test]
    async fn test_random_user_malformed_reply_aborts_before_side_effect() {
        let (_dir, store, invoker) = setup(Some("Sure! Here is a user: Ada, a@b.com"));

        let result = invoker
            .call_tool("create-random-user", None)
            .await
            .unwrap();
        assert!(result.is_failure());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_random_user_backend_failure_is_failure_content() {
        let (_dir, store, invoker) = setup(None);

        let result = invoker
            .call_tool("create-random-user", None)
            .await
            .unwrap();
        assert!(result.is_failure());
        assert!(
            result.content[0]
                .as_text()
                .unwrap()
                .contains("Generation failed")
        );
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_resource_found_and_absent() {
        let (_dir, store, invoker) = setup(None);
        store
            .append(NewUser {
                name: "Ada".to_string(),
                email: "a@b.com".to_string(),
                address: "1 Main".to_string(),
                phone: "555".to_string(),
            })
            .await
            .unwrap();

        let found = invoker.read_resource("users://1/profile").await.unwrap();
        match &found.contents[0] {
            ResourceContents::Text { text, .. } => assert!(text.contains("a@b.com")),
            _ => panic!("expected text contents"),
        }

        let absent = invoker.read_resource("users://9/profile").await.unwrap();
        match &absent.contents[0] {
            ResourceContents::Text { text, .. } => {
                assert!(text.contains("User 9 not found"))
            }
            _ => panic!("expected text contents"),
        }
    }

    #[tokio::test]
    async fn test_all_users_resource_lists_collection() {
        let (_dir, store, invoker) = setup(None);
        store
            .append(NewUser {
                name: "Ada".to_string(),
                email: "a@b.com".to_string(),
                address: "1 Main".to_string(),
                phone: "555".to_string(),
            })
            .await
            .unwrap();

        let result = invoker.read_resource(ALL_USERS_URI).await.unwrap();
        match &result.contents[0] {
            ResourceContents::Text { text, mime_type, .. } => {
                assert_eq!(mime_type.as_deref(), Some("application/json"));
                assert!(text.contains("Ada"));
            }
            _ => panic!("expected text contents"),
        }
    }

    #[tokio::test]
    async fn test_fake_user_prompt_renders_name() {
        let (_dir, _store, invoker) = setup(None);

        let mut args = HashMap::new();
        args.insert("name".to_string(), "Hopper".to_string());

        let rendering = invoker
            .render_prompt("generate-fake-user", Some(args))
            .await
            .unwrap();
        assert_eq!(rendering.messages.len(), 1);
        assert!(
            rendering.messages[0]
                .content
                .as_text()
                .unwrap()
                .contains("Hopper")
        );
    }
}
