use guided_kitchen::catalog::Catalog;
use guided_kitchen::config::RecipesConfig;
use guided_kitchen::kitchen::Kitchen;
use guided_kitchen::server;
use guided_kitchen_core::answer::{Answerer, FixedSelector, FALLBACK_REMARKS};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

fn write_recipes(tmp: &TempDir) -> RecipesConfig {
    let dir = tmp.path().join("Recipes");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("rolex.json"),
        json!({
            "name": { "en": "Rolex" },
            "description": "Omelette rolled in a chapati.",
            "prep_time_mins": 10,
            "cook_time_mins": 15,
            "ingredients": { "Main": [{ "name": "eggs", "quantity": "2", "unit": "" }] },
            "steps": [
                { "instruction": "Whisk the eggs" },
                { "instruction": "Fry the omelette" },
                { "instruction": "Roll it in the chapati" }
            ]
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        dir.join("luwombo.json"),
        r#"{"name": "Luwombo", "description": "Stew steamed in banana leaves."}"#,
    )
    .unwrap();

    RecipesConfig {
        dir,
        seed_sample: false,
        ..RecipesConfig::default()
    }
}

/// Start a server over the recipes in `tmp` and return its base URL.
async fn start_server(tmp: &TempDir) -> String {
    let config = write_recipes(tmp);
    let (catalog, _) = Catalog::load(&config).unwrap();
    let kitchen = Kitchen::offline(catalog, Answerer::new(Box::new(FixedSelector(0))));

    let port = find_free_port();
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .unwrap();
    tokio::spawn(server::serve(listener, Arc::new(kitchen)));
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn test_health_reports_recipe_count() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["recipes"], 2);
}

#[tokio::test]
async fn test_list_get_and_search() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let list: Value = client
        .get(format!("{}/api/recipes", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        list,
        json!({
            "recipes": [
                { "name": "Luwombo", "description": "Stew steamed in banana leaves." },
                { "name": "Rolex", "description": "Omelette rolled in a chapati." }
            ]
        })
    );

    let resp = client
        .get(format!("{}/api/recipe/ROLEX", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let recipe: Value = resp.json().await.unwrap();
    assert_eq!(recipe["display_name"], "Rolex");
    assert_eq!(recipe["steps"].as_array().unwrap().len(), 3);

    let resp = client
        .get(format!("{}/api/recipe/pilau", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "not_found");

    let found: Value = client
        .get(format!("{}/api/search?q=wom", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found["results"], json!(["Luwombo"]));
}

#[tokio::test]
async fn test_cook_next_until_complete() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/next", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "no_active_session");

    let cook: Value = client
        .post(format!("{}/api/cook", base))
        .json(&json!({ "recipe_name": "rolex" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cook["success"], true);
    assert_eq!(cook["recipe_name"], "Rolex");
    assert_eq!(cook["total_steps"], 3);

    let mut texts = Vec::new();
    for expected in 1..=3 {
        let step: Value = client
            .post(format!("{}/api/next", base))
            .json(&json!({}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(step["status"], "step");
        assert_eq!(step["step_number"], expected);
        texts.push(step["text"].as_str().unwrap().to_string());
    }
    assert_eq!(
        texts,
        vec!["Whisk the eggs", "Fry the omelette", "Roll it in the chapati"]
    );

    let done: Value = client
        .post(format!("{}/api/next", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(done["status"], "completed");
    assert_eq!(
        done["message"],
        "Cooking complete! Enjoy your delicious Rolex!"
    );

    let resp = client
        .post(format!("{}/api/next", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/sessions", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let session_id = created["session_id"].as_str().unwrap().to_string();

    let resp = client
        .post(format!("{}/api/cook", base))
        .json(&json!({ "recipe_name": "Rolex", "session_id": session_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The default session is still idle.
    let resp = client
        .post(format!("{}/api/next", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let step: Value = client
        .post(format!("{}/api/next", base))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(step["text"], "Whisk the eggs");

    let resp = client
        .delete(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .post(format!("{}/api/next", base))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_ask() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let answer: Value = client
        .post(format!("{}/api/ask", base))
        .json(&json!({
            "question": "how long does it take and what are the steps",
            "recipe_name": "rolex"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        answer["answer"],
        "Rolex takes 10 mins to prepare and 15 mins to cook"
    );
    assert_eq!(answer["source"], "intent");

    let answer: Value = client
        .post(format!("{}/api/ask", base))
        .json(&json!({ "question": "what ingredients?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answer["answer"], FALLBACK_REMARKS[0]);

    let resp = client
        .post(format!("{}/api/ask", base))
        .json(&json!({ "question": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/api/ask", base))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_ask_accepts_current_recipe() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let answer: Value = client
        .post(format!("{}/api/ask", base))
        .json(&json!({ "question": "what ingredients?", "current_recipe": "Rolex" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answer["answer"], "Main ingredients for Rolex: 2  eggs");
    assert_eq!(answer["recipe"], "Rolex");
}

#[tokio::test]
async fn test_session_limit_evicts_oldest() {
    let tmp = TempDir::new().unwrap();
    let config = write_recipes(&tmp);
    let (catalog, _) = Catalog::load(&config).unwrap();
    let kitchen = Kitchen::offline(catalog, Answerer::new(Box::new(FixedSelector(0))))
        .with_max_sessions(2);

    let port = find_free_port();
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .unwrap();
    tokio::spawn(server::serve(listener, Arc::new(kitchen)));
    wait_for_server(port).await;
    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let created: Value = client
            .post(format!("{}/api/sessions", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        ids.push(created["session_id"].as_str().unwrap().to_string());
    }

    let resp = client
        .post(format!("{}/api/cook", base))
        .json(&json!({ "recipe_name": "Rolex", "session_id": ids[0] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(format!("{}/api/cook", base))
        .json(&json!({ "recipe_name": "Rolex", "session_id": ids[2] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_reload_picks_up_changes() {
    let tmp = TempDir::new().unwrap();
    let base = start_server(&tmp).await;
    let client = reqwest::Client::new();

    let summary: Value = client
        .post(format!("{}/api/reload", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["changed"], false);

    fs::write(
        tmp.path().join("Recipes").join("posho.json"),
        r#"{"name": "Posho"}"#,
    )
    .unwrap();
    let summary: Value = client
        .post(format!("{}/api/reload", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["changed"], true);
    assert_eq!(summary["recipes"], 3);

    let resp = client
        .get(format!("{}/api/recipe/posho", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
