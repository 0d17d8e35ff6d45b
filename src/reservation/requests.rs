use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateReservationRequest {
    #[serde(alias = "student")]
    pub student_id: i64,
    #[serde(alias = "study_room")]
    pub room_id: i64,
    pub date: String,
    #[serde(default)]
    pub timeslots: Vec<i64>,
}

#[derive(Deserialize)]
pub struct SearchReservationQuery {
    pub student_id: Option<i64>,
    pub room_id: Option<i64>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub first_index: Option<i64>,
    pub limit: Option<i64>,
}
