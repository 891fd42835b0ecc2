// ! Interactive driver session
// !
// ! Menu loop on stdin/stdout: discover the host's capabilities, prompt the
// ! user for a selection and arguments, invoke, and render the result. A
// ! handler-side failure prints as a one-line message; the loop itself never
// ! crashes on one.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::core::error::{CapError, CapResult};
use crate::driver::query::{QueryRunner, render_content};
use crate::protocol::messages::*;
use crate::protocol::methods;
use crate::protocol::types::{FieldType, ResourceContents};
use crate::transport::envelope::Envelope;

/// The interactive session loop
pub struct DriverSession {
    envelope: Arc<Envelope>,
    runner: QueryRunner,
    input: Lines<BufReader<Stdin>>,
}

impl DriverSession {
    pub fn new(envelope: Arc<Envelope>, runner: QueryRunner) -> Self {
        Self {
            envelope,
            runner,
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Run the menu until the user quits or stdin closes
    pub async fn run(&mut self) -> CapResult<()> {
        loop {
            println!();
            println!("What would you like to do?");
            println!("  1) run a query");
            println!("  2) call a tool");
            println!("  3) read a resource");
            println!("  4) render a prompt");
            println!("  5) ping the host");
            println!("  q) quit");

            let choice = match self.prompt("> ").await? {
                Some(choice) => choice,
                None => return Ok(()),
            };

            let outcome = match choice.as_str() {
                "1" => self.run_query().await,
                "2" => self.call_tool().await,
                "3" => self.read_resource().await,
                "4" => self.render_prompt().await,
                "5" => self.ping().await,
                "q" | "quit" | "exit" => return Ok(()),
                "" => continue,
                other => {
                    println!("Unknown option '{other}'");
                    continue;
                }
            };

            // Failures render as one line; the session continues
            if let Err(e) = outcome {
                println!("error: {e}");
            }
        }
    }

    async fn run_query(&mut self) -> CapResult<()> {
        let Some(text) = self.prompt("Query: ").await? else {
            return Ok(());
        };
        let answer = self.runner.run(&text).await?;
        println!("{answer}");
        Ok(())
    }

    async fn call_tool(&mut self) -> CapResult<()> {
        let listing: ListToolsResult = self
            .envelope
            .request_typed(methods::TOOLS_LIST, None::<Value>)
            .await?;
        if listing.tools.is_empty() {
            println!("The host exposes no tools.");
            return Ok(());
        }

        for (index, tool) in listing.tools.iter().enumerate() {
            let description = tool.description.as_deref().unwrap_or("");
            println!("  {}) {} - {description}", index + 1, tool.name);
        }
        let Some(tool) = self.pick(&listing.tools, |t| &t.name).await? else {
            return Ok(());
        };

        let mut arguments = HashMap::new();
        for (name, spec) in &tool.input_schema.properties {
            let hint = spec.description.as_deref().unwrap_or(spec.field_type.name());
            let Some(raw) = self.prompt(&format!("{name} ({hint}): ")).await? else {
                return Ok(());
            };
            arguments.insert(name.clone(), coerce_argument(&raw, spec.field_type));
        }

        let params = CallToolParams::new(tool.name.clone()).with_arguments(arguments);
        let result: crate::protocol::types::CallToolResult = self
            .envelope
            .request_typed(methods::TOOLS_CALL, Some(params))
            .await?;

        if result.is_failure() {
            println!("Tool reported failure: {}", render_content(&result.content));
        } else {
            println!("{}", render_content(&result.content));
        }
        Ok(())
    }

    async fn read_resource(&mut self) -> CapResult<()> {
        let resources: ListResourcesResult = self
            .envelope
            .request_typed(methods::RESOURCES_LIST, None::<Value>)
            .await?;
        let templates: ListResourceTemplatesResult = self
            .envelope
            .request_typed(methods::RESOURCES_TEMPLATES_LIST, None::<Value>)
            .await?;

        for resource in &resources.resources {
            println!("  {}", resource.uri);
        }
        for template in &templates.resource_templates {
            println!("  {}", template.uri_template);
        }

        let Some(uri) = self.prompt("URI to read: ").await? else {
            return Ok(());
        };
        let result: ReadResourceResult = self
            .envelope
            .request_typed(methods::RESOURCES_READ, Some(ReadResourceParams::new(uri)))
            .await?;

        for contents in result.contents {
            match contents {
                ResourceContents::Text { text, .. } => println!("{text}"),
                ResourceContents::Blob { uri, .. } => println!("(binary contents at {uri})"),
            }
        }
        Ok(())
    }

    async fn render_prompt(&mut self) -> CapResult<()> {
        let listing: ListPromptsResult = self
            .envelope
            .request_typed(methods::PROMPTS_LIST, None::<Value>)
            .await?;
        if listing.prompts.is_empty() {
            println!("The host exposes no prompts.");
            return Ok(());
        }

        for (index, prompt) in listing.prompts.iter().enumerate() {
            let description = prompt.description.as_deref().unwrap_or("");
            println!("  {}) {} - {description}", index + 1, prompt.name);
        }
        let Some(prompt) = self.pick(&listing.prompts, |p| &p.name).await? else {
            return Ok(());
        };

        let mut arguments = HashMap::new();
        for argument in prompt.arguments.as_deref().unwrap_or_default() {
            let hint = argument.description.as_deref().unwrap_or("");
            let Some(value) = self.prompt(&format!("{} ({hint}): ", argument.name)).await? else {
                return Ok(());
            };
            arguments.insert(argument.name.clone(), value);
        }

        let params = GetPromptParams::new(prompt.name.clone()).with_arguments(arguments);
        let result: crate::protocol::types::GetPromptResult = self
            .envelope
            .request_typed(methods::PROMPTS_GET, Some(params))
            .await?;

        for message in result.messages {
            let role = match message.role {
                crate::protocol::types::Role::User => "user",
                crate::protocol::types::Role::Assistant => "assistant",
            };
            println!("[{role}] {}", render_content(&[message.content]));
        }
        Ok(())
    }

    async fn ping(&mut self) -> CapResult<()> {
        let _: PingResult = self
            .envelope
            .request_typed(methods::PING, None::<Value>)
            .await?;
        println!("pong");
        Ok(())
    }

    /// Print a prompt and read one trimmed line; None means stdin closed
    async fn prompt(&mut self, prompt: &str) -> CapResult<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await.map_err(CapError::io)?;
        stdout.flush().await.map_err(CapError::io)?;

        let line = self.input.next_line().await.map_err(CapError::io)?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    /// Prompt for a 1-based selection out of a listed set
    async fn pick<'a, T>(
        &mut self,
        items: &'a [T],
        name: impl Fn(&T) -> &str,
    ) -> CapResult<Option<&'a T>> {
        let Some(raw) = self.prompt("Select: ").await? else {
            return Ok(None);
        };

        // Accept a number or an exact name
        if let Ok(index) = raw.parse::<usize>() {
            if index >= 1 && index <= items.len() {
                return Ok(Some(&items[index - 1]));
            }
        }
        if let Some(item) = items.iter().find(|item| name(*item) == raw) {
            return Ok(Some(item));
        }

        println!("No such entry '{raw}'");
        Ok(None)
    }
}

/// Interpret raw user input according to the declared field type, falling
/// back to the raw string when it does not parse
fn coerce_argument(raw: &str, field_type: FieldType) -> Value {
    match field_type {
        FieldType::String => Value::String(raw.to_string()),
        FieldType::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        FieldType::Number => raw
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        FieldType::Boolean => match raw {
            "true" | "yes" | "y" => Value::Bool(true),
            "false" | "no" | "n" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        FieldType::Array | FieldType::Object => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_argument_types() {
        assert_eq!(coerce_argument("Ada", FieldType::String), json!("Ada"));
        assert_eq!(coerce_argument("42", FieldType::Integer), json!(42));
        assert_eq!(coerce_argument("2.5", FieldType::Number), json!(2.5));
        assert_eq!(coerce_argument("yes", FieldType::Boolean), json!(true));
        assert_eq!(
            coerce_argument(r#"{"a":1}"#, FieldType::Object),
            json!({"a":1})
        );
    }

    #[test]
    fn test_coerce_argument_falls_back_to_string() {
        // Unparseable input is handed to the host as-is; schema validation
        // reports it with a proper message instead of a local parse error
        assert_eq!(
            coerce_argument("not-a-number", FieldType::Integer),
            json!("not-a-number")
        );
    }
}
