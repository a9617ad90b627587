//! Progress events received over the server-sent event stream.

use serde::Deserialize;

/// One message of the progress stream, discriminated by `type`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress { sent: u32, total: u32, message: String },
    EmailSent { company: String },
    EmailFailed { company: String, error: String },
    Completed { sent: u32, total: u32, failed: u32 },
    Cancelled,
}

impl ProgressEvent {
    /// Decode a raw SSE payload; anything unrecognised yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_variant() {
        assert_eq!(
            ProgressEvent::parse(r#"{"type":"progress","sent":3,"total":10,"message":"Sending"}"#),
            Some(ProgressEvent::Progress { sent: 3, total: 10, message: "Sending".into() })
        );
        assert_eq!(
            ProgressEvent::parse(r#"{"type":"email_sent","company":"Acme"}"#),
            Some(ProgressEvent::EmailSent { company: "Acme".into() })
        );
        assert_eq!(
            ProgressEvent::parse(r#"{"type":"email_failed","company":"Globex","error":"bounced"}"#),
            Some(ProgressEvent::EmailFailed { company: "Globex".into(), error: "bounced".into() })
        );
        assert_eq!(
            ProgressEvent::parse(r#"{"type":"completed","sent":8,"total":10,"failed":2}"#),
            Some(ProgressEvent::Completed { sent: 8, total: 10, failed: 2 })
        );
        assert_eq!(ProgressEvent::parse(r#"{"type":"cancelled"}"#), Some(ProgressEvent::Cancelled));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ProgressEvent::parse(r#"{"sent":3,"total":10}"#), None);
        assert_eq!(ProgressEvent::parse(r#"{"type":"paused"}"#), None);
        assert_eq!(ProgressEvent::parse(r#"{"type":"progress","sent":-1,"total":10,"message":""}"#), None);
        assert_eq!(ProgressEvent::parse("keep-alive"), None);
        assert_eq!(ProgressEvent::parse(""), None);
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        assert_eq!(
            ProgressEvent::parse(r#"{"type":"email_sent","company":"Acme","jobId":"x"}"#),
            Some(ProgressEvent::EmailSent { company: "Acme".into() })
        );
    }
}
