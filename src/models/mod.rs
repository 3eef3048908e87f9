pub mod rating;
pub mod rating_date;
pub mod tags;
pub mod user_record;
