use std::sync::Arc;
use std::time::Duration;

use realty_core::Address;
use realty_ledger::{DEFAULT_GAS_LIMIT, EstateRegistry, InMemoryLedger, LedgerConnection};
use reqwest::StatusCode;
use serde_json::{Value, json};

use realty_api::app::services::{AppServices, SessionStore};

const ALICE: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const ALICE_ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";
const BOB: &str = "0x0000000000000000000000000000000000000000000000000000000000000002";
const ZERO_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000000";

struct TestServer {
    base_url: String,
    ledger: Arc<InMemoryLedger>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(SessionStore::new()).await
    }

    async fn spawn_with(sessions: SessionStore) -> Self {
        // Same router as prod, backed by the in-memory ledger on an ephemeral port.
        let contract: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap();
        let ledger = Arc::new(InMemoryLedger::new(contract));
        let connection: Arc<dyn LedgerConnection> = ledger.clone();
        let registry = EstateRegistry::open(connection, contract, DEFAULT_GAS_LIMIT, None)
            .await
            .unwrap();
        let app = realty_api::app::router(Arc::new(AppServices::with_sessions(registry, sessions)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            ledger,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in and return `(token, address)`.
    async fn login(&self, secret: &str) -> (String, String) {
        let res = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "secret": secret }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        (
            body["token"].as_str().unwrap().to_string(),
            body["address"].as_str().unwrap().to_string(),
        )
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn expect_error(res: reqwest::Response, status: StatusCode, code: &str) -> String {
    let actual = res.status();
    let body: Value = res.json().await.unwrap();
    assert_eq!(actual, status, "body={body}");
    assert_eq!(body["error"], code, "body={body}");
    body["message"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/estates")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.get(&uuid_like(), "/account").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.get("not-a-token", "/account").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

fn uuid_like() -> String {
    "01890a5d-ac96-774b-bcce-b302099a8057".to_string()
}

#[tokio::test]
async fn login_rejects_bad_secrets() {
    let srv = TestServer::spawn().await;
    for secret in ["", "zz", "1234", ZERO_KEY] {
        let res = srv
            .client
            .post(srv.url("/login"))
            .json(&json!({ "secret": secret }))
            .send()
            .await
            .unwrap();
        expect_error(res, StatusCode::BAD_REQUEST, "invalid_secret").await;
    }
}

#[tokio::test]
async fn account_shows_address_balance_and_admin_flag() {
    let srv = TestServer::spawn().await;
    let (token, address) = srv.login(ALICE).await;
    assert_eq!(address, ALICE_ADDRESS);

    srv.ledger.fund(ALICE_ADDRESS.parse().unwrap(), 1_000_000_000_000_000_000_000);
    srv.ledger.add_admin(ALICE_ADDRESS.parse().unwrap());

    let res = srv.get(&token, "/account").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["address"], ALICE_ADDRESS);
    assert_eq!(body["balance"], "1000000000000000000000");
    assert_eq!(body["isAdmin"], true);
}

#[tokio::test]
async fn estate_lifecycle_create_list_get() {
    let srv = TestServer::spawn().await;
    let (token, address) = srv.login(ALICE).await;

    let res = srv
        .post(&token, "/estates", json!({ "info": "flat", "area": 100, "usableArea": "80" }))
        .await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["tx"]["nonce"], 0);
    assert!(body["tx"]["hash"].as_str().unwrap().starts_with("0x"));

    let res = srv.get(&token, "/estates").await;
    assert_eq!(res.status(), StatusCode::OK);
    let estates: Vec<Value> = res.json().await.unwrap();
    assert_eq!(estates.len(), 1);
    let estate = &estates[0];
    assert_eq!(estate["id"], 0);
    assert_eq!(estate["owner"], address);
    assert_eq!(estate["info"], "flat");
    assert_eq!(estate["area"], 100);
    assert_eq!(estate["usableArea"], 80);
    assert_eq!(estate["renter"], Value::Null);
    assert_eq!(estate["presented"], false);
    assert_eq!(estate["forSale"], false);
    assert_eq!(estate["forRent"], false);

    let res = srv.get(&token, "/estates/0").await;
    assert_eq!(res.status(), StatusCode::OK);
    let single: Value = res.json().await.unwrap();
    assert_eq!(&single, estate);

    let res = srv.get(&token, "/estates/9").await;
    expect_error(res, StatusCode::NOT_FOUND, "not_found").await;

    let res = srv.get(&token, "/estates/abc").await;
    expect_error(res, StatusCode::BAD_REQUEST, "validation_error").await;
}

#[tokio::test]
async fn estate_input_is_validated_locally_and_remotely() {
    let srv = TestServer::spawn().await;
    let (token, _) = srv.login(ALICE).await;

    for body in [
        json!({ "info": "x", "area": -5, "usableArea": 1 }),
        json!({ "info": "x", "area": "ten", "usableArea": 1 }),
        json!({ "info": "x", "area": 1.5, "usableArea": 1 }),
        json!({ "info": "x", "area": 10, "usableArea": 1, "owner": "0x1234" }),
    ] {
        let res = srv.post(&token, "/estates", body).await;
        expect_error(res, StatusCode::BAD_REQUEST, "validation_error").await;
    }
    assert!(srv.ledger.submitted().is_empty());

    // usableArea <= area is the ledger's rule, surfaced verbatim.
    let res = srv
        .post(&token, "/estates", json!({ "info": "x", "area": 10, "usableArea": 20 }))
        .await;
    let message = expect_error(res, StatusCode::UNPROCESSABLE_ENTITY, "submit_error").await;
    assert_eq!(message, "execution reverted: usable area exceeds area");
}

#[tokio::test]
async fn present_flow_transfers_ownership() {
    let srv = TestServer::spawn().await;
    let (alice, _) = srv.login(ALICE).await;
    let (bob, bob_address) = srv.login(BOB).await;

    let res = srv
        .post(&alice, "/estates", json!({ "info": "house", "area": 100, "usableArea": 80 }))
        .await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let res = srv
        .post(&alice, "/estates/0/present", json!({ "recipient": bob_address.to_lowercase() }))
        .await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let presents: Vec<Value> = srv.get(&bob, "/presents").await.json().await.unwrap();
    assert_eq!(presents.len(), 1);
    assert_eq!(presents[0]["estateId"], 0);
    assert_eq!(presents[0]["to"], bob_address);
    assert_eq!(presents[0]["finished"], false);

    let res = srv.post(&bob, "/presents/0/confirm", json!({})).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let presents: Vec<Value> = srv.get(&bob, "/presents?filter=all").await.json().await.unwrap();
    assert!(presents.is_empty());

    let present: Value = srv.get(&bob, "/presents/0").await.json().await.unwrap();
    assert_eq!(present["finished"], true);

    let estate: Value = srv.get(&alice, "/estates/0").await.json().await.unwrap();
    assert_eq!(estate["owner"], bob_address);

    let mine: Vec<Value> = srv.get(&alice, "/estates?filter=mine").await.json().await.unwrap();
    assert!(mine.is_empty());
    let by_bob: Vec<Value> = srv
        .get(&alice, &format!("/estates?filter={bob_address}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_bob.len(), 1);
}

#[tokio::test]
async fn offers_cancel_by_kind() {
    let srv = TestServer::spawn().await;
    let (token, _) = srv.login(ALICE).await;
    srv.post(&token, "/estates", json!({ "info": "house", "area": 100, "usableArea": 80 }))
        .await;
    srv.ledger.set_for_rent(0, true);

    let res = srv.post(&token, "/offers/rent/0/cancel", json!({})).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let estate: Value = srv.get(&token, "/estates/0").await.json().await.unwrap();
    assert_eq!(estate["forRent"], false);

    let res = srv.post(&token, "/offers/lease/0/cancel", json!({})).await;
    expect_error(res, StatusCode::BAD_REQUEST, "validation_error").await;

    let res = srv.post(&token, "/offers/present/42/cancel", json!({})).await;
    let message = expect_error(res, StatusCode::UNPROCESSABLE_ENTITY, "submit_error").await;
    assert_eq!(message, "execution reverted: present does not exist");
}

#[tokio::test]
async fn read_failures_surface_as_bad_gateway() {
    let srv = TestServer::spawn().await;
    let (token, _) = srv.login(ALICE).await;
    for _ in 0..3 {
        srv.post(&token, "/estates", json!({ "info": "e", "area": 10, "usableArea": 5 }))
            .await;
    }
    srv.ledger.fail_reads_at(realty_core::RecordKind::Estate, 1);

    let res = srv.get(&token, "/estates?filter=all").await;
    expect_error(res, StatusCode::BAD_GATEWAY, "read_error").await;

    let res = srv.get(&token, "/estates?filter=nobody").await;
    expect_error(res, StatusCode::BAD_REQUEST, "validation_error").await;
}

#[tokio::test]
async fn relogin_replaces_identity_atomically() {
    let srv = TestServer::spawn().await;
    let (token, _) = srv.login(ALICE).await;

    // A bad secret on an existing session leaves it as it was.
    let res = srv.post(&token, "/login", json!({ "secret": "garbage" })).await;
    expect_error(res, StatusCode::BAD_REQUEST, "invalid_secret").await;
    let account: Value = srv.get(&token, "/account").await.json().await.unwrap();
    assert_eq!(account["address"], ALICE_ADDRESS);

    let res = srv.post(&token, "/login", json!({ "secret": BOB })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["token"], token);
    assert_ne!(body["address"], ALICE_ADDRESS);

    let account: Value = srv.get(&token, "/account").await.json().await.unwrap();
    assert_eq!(account["address"], body["address"]);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let srv = TestServer::spawn().await;
    let (token, _) = srv.login(ALICE).await;

    let res = srv.post(&token, "/logout", json!({})).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.get(&token, "/account").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn idle_session_is_signed_out() {
    let srv = TestServer::spawn_with(SessionStore::with_limits(Duration::from_millis(50), 16)).await;
    let (token, _) = srv.login(ALICE).await;
    assert_eq!(srv.get(&token, "/account").await.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(120)).await;
    let res = srv.get(&token, "/account").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_logins_cannot_grow_sessions_past_the_cap() {
    let srv = TestServer::spawn_with(SessionStore::with_limits(Duration::from_secs(60), 2)).await;
    let (first, _) = srv.login(ALICE).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let (second, _) = srv.login(ALICE).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let (third, _) = srv.login(BOB).await;

    assert_eq!(srv.get(&first, "/account").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(srv.get(&second, "/account").await.status(), StatusCode::OK);
    assert_eq!(srv.get(&third, "/account").await.status(), StatusCode::OK);
}
