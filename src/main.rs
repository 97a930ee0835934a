#[tokio::main]
async fn main() {
    medvice::run().await;
}
