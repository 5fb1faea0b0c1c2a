use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SecuredResponse {
    pub success: bool,
    pub identity: String,
    pub roles: Vec<String>,
}
