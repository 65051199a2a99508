use serde_json::Value;

const REJECTED_MESSAGE: &str = "The request was rejected by the server";
const SERVER_ERROR_MESSAGE: &str = "The server encountered an error. Please try again later";

/// Turns an upstream error response into a message fit for a toast.
///
/// Understands FastAPI `detail` (string or list of `{loc, msg}`) and a plain
/// `message` field; anything else gets a generic message by status class.
pub fn api_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| message_from_json(&value))
        .unwrap_or_else(|| generic_message(status).to_string())
}

fn message_from_json(value: &Value) -> Option<String> {
    match value.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => {
            return Some(detail.trim().to_string());
        }
        Some(Value::Array(items)) => {
            let messages: Vec<String> = items.iter().filter_map(validation_item).collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

fn validation_item(item: &Value) -> Option<String> {
    let msg = item.get("msg").and_then(Value::as_str)?.trim();
    if msg.is_empty() {
        return None;
    }

    // `loc` looks like ["body", 0, "topic_id"]; the last string is the field.
    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.iter().rev().find_map(Value::as_str))
        .filter(|field| *field != "body");

    Some(match field {
        Some(field) => format!("{}: {}", field, msg),
        None => msg.to_string(),
    })
}

fn generic_message(status: u16) -> &'static str {
    if (400..500).contains(&status) {
        REJECTED_MESSAGE
    } else {
        SERVER_ERROR_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail() {
        assert_eq!(
            api_error_message(409, r#"{"detail": "Subject code already exists"}"#),
            "Subject code already exists"
        );
    }

    #[test]
    fn validation_detail_list() {
        let body = r#"{"detail": [
            {"loc": ["body", 0, "topic_id"], "msg": "field required", "type": "missing"},
            {"loc": ["body"], "msg": "list too long"}
        ]}"#;
        assert_eq!(
            api_error_message(422, body),
            "topic_id: field required; list too long"
        );
    }

    #[test]
    fn message_field() {
        assert_eq!(
            api_error_message(400, r#"{"message": "Bad payload"}"#),
            "Bad payload"
        );
    }

    #[test]
    fn falls_back_by_status() {
        assert_eq!(api_error_message(404, "<html>nope</html>"), REJECTED_MESSAGE);
        assert_eq!(api_error_message(502, ""), SERVER_ERROR_MESSAGE);
        assert_eq!(
            api_error_message(500, r#"{"detail": "   "}"#),
            SERVER_ERROR_MESSAGE
        );
        assert_eq!(api_error_message(400, r#"{"detail": []}"#), REJECTED_MESSAGE);
    }
}
