use anyhow::Result;
use serde_json::json;

// Needs `cargo run` in another terminal; prints raw responses.
#[tokio::test]
#[ignore = "requires a running server on localhost:8080"]
async fn quick_dev() -> Result<()> {
    let hc = httpc_test::new_client("http://localhost:8080")?;

    // No session headers: expect 401 from the API.
    hc.do_get("/api/profile").await?.print().await?;

    hc.do_post("/api/posts", json!({ "caption": "no file here" }))
        .await?
        .print()
        .await?;

    // Media is served without a session.
    hc.do_get("/media/posts/missing.png").await?.print().await?;

    Ok(())
}
