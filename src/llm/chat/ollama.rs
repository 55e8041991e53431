use reqwest::{ Client as HttpClient, StatusCode };
use serde::{ Deserialize, Serialize };
use async_trait::async_trait;
use super::ChatClient;
use crate::llm::{ ChatError, LlmConfig };
use crate::models::chat::RequestMessage;
use log::{ debug, info, warn };

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: HttpClient,
    completion_model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [RequestMessage],
}

#[derive(Deserialize)]
struct StreamLine {
    message: Option<StreamMessage>,
}

#[derive(Deserialize)]
struct StreamMessage {
    content: Option<String>,
}

impl OllamaClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let http = HttpClient::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            completion_model: config.model.clone(),
        })
    }

    pub async fn chat(
        &self,
        history: &[RequestMessage],
        base_url: &str
    ) -> Result<String, ChatError> {
        let url = chat_url(base_url)?;
        let req = ChatRequest {
            model: &self.completion_model,
            messages: history,
        };

        info!("Sending {} messages to {}", history.len(), url);
        let resp = self.http.post(url).json(&req).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            warn!("Inference request failed with status {}", status);
            return Err(ChatError::Status(status));
        }

        let body = resp.text().await?;
        debug!("API response: {}", body);

        let content = parse_chat_stream(&body);
        if content.is_empty() {
            return Err(ChatError::EmptyContent);
        }
        Ok(content)
    }
}

fn chat_url(base_url: &str) -> Result<reqwest::Url, ChatError> {
    let invalid = || ChatError::InvalidUrl(base_url.to_string());
    let mut url = reqwest::Url::parse(base_url.trim()).map_err(|_| invalid())?;
    if url.cannot_be_a_base() || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid());
    }
    let path = format!("{}/api/chat", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

/// Concatenates every `message.content` fragment of a line-delimited JSON body.
/// Lines that are not JSON are logged and skipped.
pub fn parse_chat_stream(body: &str) -> String {
    let mut content = String::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<StreamLine>(line) {
            Ok(StreamLine { message: Some(StreamMessage { content: Some(fragment) }) }) => {
                content.push_str(&fragment);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("JSON parse error: {} for line: {}", e, line);
            }
        }
    }
    content
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn send(
        &self,
        history: &[RequestMessage],
        base_url: &str
    ) -> Result<String, ChatError> {
        self.chat(history, base_url).await
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{ body_json, header, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    fn history() -> Vec<RequestMessage> {
        vec![
            RequestMessage { role: Role::Assistant, content: "Hallo".to_string() },
            RequestMessage { role: Role::User, content: "Hi there".to_string() }
        ]
    }

    fn client() -> OllamaClient {
        OllamaClient::from_config(&LlmConfig::default()).unwrap()
    }

    #[test]
    fn fragments_are_concatenated_in_order() {
        let body = "{\"message\":{\"content\":\"Hel\"}}\n{\"message\":{\"content\":\"lo\"}}";
        assert_eq!(parse_chat_stream(body), "Hello");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let body = "{\"message\":\n{\"message\":{\"content\":\"Hi\"}}\n";
        assert_eq!(parse_chat_stream(body), "Hi");
    }

    #[test]
    fn lines_without_content_contribute_nothing() {
        let body = "{\"done\":true}\n\n{\"message\":{\"role\":\"assistant\"}}\r\n";
        assert_eq!(parse_chat_stream(body), "");
    }

    #[test]
    fn chat_url_appends_route_to_base_path() {
        assert_eq!(chat_url("http://h:11434").unwrap().as_str(), "http://h:11434/api/chat");
        assert_eq!(
            chat_url(" http://h:11434/ollama/ ").unwrap().as_str(),
            "http://h:11434/ollama/api/chat"
        );
    }

    #[test]
    fn chat_url_refuses_query_and_fragment() {
        assert!(matches!(chat_url("http://h:11434?x"), Err(ChatError::InvalidUrl(_))));
        assert!(matches!(chat_url("http://h:11434#frag"), Err(ChatError::InvalidUrl(_))));
        assert!(matches!(chat_url("mailto:someone@example.com"), Err(ChatError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn posts_full_history_and_joins_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("content-type", "application/json"))
            .and(
                body_json(
                    json!({
                    "model": "llama3.2",
                    "messages": [
                        { "role": "assistant", "content": "Hallo" },
                        { "role": "user", "content": "Hi there" }
                    ]
                })
                )
            )
            .respond_with(
                ResponseTemplate::new(200).set_body_string(
                    "{\"message\":{\"role\":\"assistant\",\"content\":\"Guten \"},\"done\":false}\n\
                     {\"message\":{\"role\":\"assistant\",\"content\":\"Tag\"},\"done\":false}\n\
                     {\"done\":true}\n"
                )
            )
            .expect(1)
            .mount(&server).await;

        let reply = client().send(&history(), &format!("{}/", server.uri())).await.unwrap();
        assert_eq!(reply, "Guten Tag");
    }

    #[tokio::test]
    async fn non_ok_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string("{\"message\":{\"content\":\"x\"}}")
            )
            .mount(&server).await;

        let err = client().send(&history(), &server.uri()).await.unwrap_err();
        assert!(matches!(err, ChatError::Status(StatusCode::INTERNAL_SERVER_ERROR)));
    }

    #[tokio::test]
    async fn ok_without_content_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"done\":true}\n"))
            .mount(&server).await;

        let err = client().send(&history(), &server.uri()).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyContent));
    }

    #[tokio::test]
    async fn slow_server_hits_request_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"message\":{\"content\":\"late\"}}")
                    .set_delay(Duration::from_secs(5))
            )
            .mount(&server).await;

        let config = LlmConfig {
            request_timeout: Duration::from_millis(200),
            ..LlmConfig::default()
        };
        let client = OllamaClient::from_config(&config).unwrap();
        let err = client.send(&history(), &server.uri()).await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
    }

    #[tokio::test]
    async fn unparsable_base_url_is_rejected() {
        let err = client().send(&history(), "not a url").await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidUrl(_)));
    }
}
