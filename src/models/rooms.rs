use crate::schema::rooms;

#[derive(Queryable, Clone, Debug, PartialEq)]
pub struct RoomData {
    pub id: i64,
    pub room_number: String,
    pub floor: String,
}

#[derive(Insertable)]
#[table_name = "rooms"]
pub struct NewRoom {
    pub room_number: String,
    pub floor: String,
}

impl NewRoom {
    pub fn new<S: Into<String>>(room_number: S) -> Self {
        let room_number = room_number.into();
        let floor = floor_label(&room_number).to_string();
        Self { room_number, floor }
    }
}

/// Floor of a room, taken from the leading digit of its number ("2.205" is on the 2nd floor).
pub fn floor_label(room_number: &str) -> &'static str {
    match room_number.chars().next() {
        Some('1') => "1st",
        Some('2') => "2nd",
        Some('3') => "3rd",
        _ => "N/A",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_follows_leading_digit() {
        assert_eq!(floor_label("1.203"), "1st");
        assert_eq!(floor_label("2.205"), "2nd");
        assert_eq!(floor_label("3.205"), "3rd");
        assert_eq!(floor_label("4.101"), "N/A");
        assert_eq!(floor_label("B.12"), "N/A");
        assert_eq!(floor_label(""), "N/A");
    }

    #[test]
    fn new_room_derives_floor() {
        let room = NewRoom::new("2.203");
        assert_eq!(room.room_number, "2.203");
        assert_eq!(room.floor, "2nd");
    }
}
