use salvo::handler;

#[handler]
pub async fn alive() -> &'static str {
    "alive ok"
}
