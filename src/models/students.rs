use crate::schema::students;

#[derive(Queryable, Clone, Debug, PartialEq)]
pub struct StudentData {
    pub id: i64,
    pub institution_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Insertable)]
#[table_name = "students"]
pub struct NewStudent {
    pub institution_id: String,
    pub name: String,
    pub email: String,
}
