use serde::Deserialize;

#[derive(Deserialize)]
pub struct AvailableQuery {
    pub room_id: i64,
    pub date: String,
}

#[derive(Deserialize)]
pub struct CreateStudentRequest {
    pub institution_id: String,
    pub name: String,
    pub email: String,
}
