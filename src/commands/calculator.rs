//! Four-function calculator command handler.

use serde_json::{json, Map, Value};

use super::{CommandDescriptor, CommandError, CommandHandler};

fn number_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "a": { "type": "number" },
            "b": { "type": "number" }
        },
        "required": ["a", "b"]
    })
}

/// Calculator over two required numeric arguments `a` and `b`.
pub struct Calculator {
    descriptors: Vec<CommandDescriptor>,
}

impl Calculator {
    /// Build the calculator with its fixed descriptor set.
    #[must_use]
    pub fn new() -> Self {
        let descriptors = [
            ("add", "Add two numbers together"),
            ("subtract", "Subtract second number from first"),
            ("multiply", "Multiply two numbers"),
            ("divide", "Divide first number by second"),
        ]
        .into_iter()
        .map(|(name, description)| CommandDescriptor {
            name: name.into(),
            description: description.into(),
            input_schema: number_schema(),
        })
        .collect();

        Self { descriptors }
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a required numeric argument.
///
/// Missing or non-numeric values are rejected rather than coerced to zero.
fn required_number(args: &Map<String, Value>, key: &str) -> Result<f64, CommandError> {
    args.get(key)
        .ok_or_else(|| CommandError::BadArgument(format!("missing argument: {key}")))?
        .as_f64()
        .ok_or_else(|| CommandError::BadArgument(format!("argument {key} must be a number")))
}

impl CommandHandler for Calculator {
    fn descriptors(&self) -> &[CommandDescriptor] {
        &self.descriptors
    }

    #[allow(clippy::float_cmp)] // exact zero divisor check, not a tolerance test
    fn invoke(&self, name: &str, args: &Map<String, Value>) -> Result<Value, CommandError> {
        if !self.descriptors.iter().any(|d| d.name == name) {
            return Err(CommandError::UnknownCommand(name.into()));
        }

        let a = required_number(args, "a")?;
        let b = required_number(args, "b")?;

        let result = match name {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" => {
                if b == 0.0 {
                    return Err(CommandError::Domain("division by zero".into()));
                }
                a / b
            }
            other => return Err(CommandError::UnknownCommand(other.into())),
        };

        Ok(json!(result))
    }
}
