table! {
    students (id) {
        id -> BigInt,
        institution_id -> Text,
        name -> Text,
        email -> Text,
    }
}

table! {
    rooms (id) {
        id -> BigInt,
        room_number -> Text,
        floor -> Text,
    }
}

table! {
    timeslots (id) {
        id -> BigInt,
        start_time -> Time,
        end_time -> Time,
    }
}

table! {
    reservations (id) {
        id -> BigInt,
        student_id -> BigInt,
        room_id -> BigInt,
        date -> Date,
        start_time -> Time,
        end_time -> Time,
        status -> Text,
        created_at -> Timestamp,
    }
}

table! {
    reservation_slots (reservation_id, slot_id) {
        reservation_id -> BigInt,
        slot_id -> BigInt,
        room_id -> BigInt,
        date -> Date,
        released -> Bool,
    }
}

joinable!(reservation_slots -> reservations (reservation_id));
joinable!(reservation_slots -> timeslots (slot_id));
joinable!(reservations -> rooms (room_id));
joinable!(reservations -> students (student_id));

allow_tables_to_appear_in_same_query!(
    reservation_slots,
    reservations,
    rooms,
    students,
    timeslots,
);
