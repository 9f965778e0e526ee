/*
[INPUT]:  User identifier and bearer token
[OUTPUT]: Seconds worked today
[POS]:    HTTP layer - time aggregate endpoint
[UPDATE]: When the time-tracking aggregate changes shape
*/

use crate::http::{Result, TaskdeckClient};
use crate::types::{UserId, WorkHours};

impl TaskdeckClient {
    /// Aggregate time worked by a user today
    ///
    /// GET /task-time/user-one-day/{userId}
    pub async fn user_hours_today(&self, user_id: &UserId) -> Result<WorkHours> {
        let user = user_id.to_string();
        let url = self.endpoint_url(&["task-time", "user-one-day", &user])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{ClientConfig, TaskdeckClient};
    use crate::types::EntityId;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_user_hours_today() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/task-time/user-one-day/4"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "totalHours": 5400 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client =
            TaskdeckClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        client.set_token("test-token", Some(EntityId::Number(4)));

        let hours = client
            .user_hours_today(&EntityId::Number(4))
            .await
            .expect("user_hours_today failed");
        assert_eq!(hours.total_seconds(), 5400);
    }
}
