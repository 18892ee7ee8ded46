#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    statusboard_lib::run().await
}
