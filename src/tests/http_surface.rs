// End-to-end tests of the HTTP surface: shared-secret gate, provider
// error mapping, URL validation and the signed payload itself.

#[cfg(test)]
mod test {
    use httpmock::prelude::*;
    use reqwest::StatusCode;
    use serde_json::Value;

    use crate::signing::signature::{sign_with, NONCE_ALPHABET, NONCE_LEN};
    use crate::tests::common::{
        build_reqwest_client, mock_ticket_grant, mock_token_grant, mock_token_refusal, spawn_axum,
        test_settings, test_state, TEST_SERVER_SECRET,
    };
    use crate::utils::constants::JS_TICKET_CACHE_KEY;

    #[tokio::test]
    async fn wrong_secret_is_rejected_before_any_upstream_work() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_grant(&server, "tok-live").await;

        let (state, _cache) = test_state(test_settings(&server.base_url(), 60, &["localhost"])).await;
        let (handle, addr) = spawn_axum(state.router()).await;
        let client = build_reqwest_client();

        for path in ["/access_token/wrong-secret", "/js_ticket/wrong-secret"] {
            let response = client
                .get(format!("http://{}{}", addr, path))
                .send()
                .await
                .expect("request");

            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            let body: Value = response.json().await.expect("json body");
            assert_eq!(body["detail"], "bad token");
        }
        token_mock.assert_calls_async(0).await;

        handle.abort();
    }

    #[tokio::test]
    async fn access_token_endpoint_serves_the_token() {
        let server = MockServer::start_async().await;
        let _token_mock = mock_token_grant(&server, "tok-live").await;

        let (state, _cache) = test_state(test_settings(&server.base_url(), 60, &["localhost"])).await;
        let (handle, addr) = spawn_axum(state.router()).await;
        let client = build_reqwest_client();

        let response = client
            .get(format!("http://{}/access_token/{}", addr, TEST_SERVER_SECRET))
            .send()
            .await
            .expect("request");

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("json body");
        assert_eq!(body["token"], "tok-live");

        handle.abort();
    }

    #[tokio::test]
    async fn js_ticket_endpoint_serves_the_ticket() {
        let server = MockServer::start_async().await;
        let _token_mock = mock_token_grant(&server, "tok-live").await;
        let _ticket_mock = mock_ticket_grant(&server, "tok-live", "tkt-live").await;

        let (state, _cache) = test_state(test_settings(&server.base_url(), 60, &["localhost"])).await;
        let (handle, addr) = spawn_axum(state.router()).await;
        let client = build_reqwest_client();

        let response = client
            .get(format!("http://{}/js_ticket/{}", addr, TEST_SERVER_SECRET))
            .send()
            .await
            .expect("request");

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("json body");
        assert_eq!(body["token"], "tkt-live");

        handle.abort();
    }

    #[tokio::test]
    async fn provider_refusal_maps_to_not_found_with_verbatim_envelope() {
        let server = MockServer::start_async().await;
        let _token_mock = mock_token_refusal(&server, 40013, "invalid appid").await;

        let (state, _cache) = test_state(test_settings(&server.base_url(), 60, &["localhost"])).await;
        let (handle, addr) = spawn_axum(state.router()).await;
        let client = build_reqwest_client();

        let response = client
            .get(format!("http://{}/access_token/{}", addr, TEST_SERVER_SECRET))
            .send()
            .await
            .expect("request");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = response.json().await.expect("json body");
        assert_eq!(body["errcode"], 40013);
        assert_eq!(body["errmsg"], "invalid appid");

        handle.abort();
    }

    #[tokio::test]
    async fn signature_endpoint_rejects_bad_and_foreign_urls() {
        let server = MockServer::start_async().await;
        let token_mock = mock_token_grant(&server, "tok-live").await;

        let (state, _cache) = test_state(test_settings(&server.base_url(), 60, &["localhost"])).await;
        let (handle, addr) = spawn_axum(state.router()).await;
        let client = build_reqwest_client();

        let cases = [
            ("not-a-url", "bad url"),
            ("https://evil.test/page", "domain isn't in whitelist"),
        ];
        for (url, detail) in cases {
            let response = client
                .get(format!("http://{}/js_sdk/signature", addr))
                .query(&[("url", url)])
                .send()
                .await
                .expect("request");

            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            let body: Value = response.json().await.expect("json body");
            assert_eq!(body["detail"], detail);
        }
        // rejected before the ticket chain ran
        token_mock.assert_calls_async(0).await;

        handle.abort();
    }

    #[tokio::test]
    async fn signature_endpoint_signs_an_allowed_url() {
        let server = MockServer::start_async().await;

        let (state, cache) = test_state(test_settings(&server.base_url(), 60, &["localhost"])).await;
        cache.set(JS_TICKET_CACHE_KEY, "abc", 60).await;

        let (handle, addr) = spawn_axum(state.router()).await;
        let client = build_reqwest_client();

        let target = "https://localhost/page";
        let response = client
            .get(format!("http://{}/js_sdk/signature", addr))
            .query(&[("url", target)])
            .send()
            .await
            .expect("request");

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("json body");

        let nonce = body["nonce"].as_str().expect("nonce");
        assert_eq!(nonce.len(), NONCE_LEN);
        assert!(nonce.bytes().all(|b| NONCE_ALPHABET.contains(&b)));

        let timestamp = body["timestamp"].as_i64().expect("timestamp");
        assert!(timestamp > 0);

        // the payload must verify against the reconstructed canonical string
        let expected = sign_with("abc", nonce, timestamp, target);
        assert_eq!(body["signature"].as_str().expect("signature"), expected);

        handle.abort();
    }
}
