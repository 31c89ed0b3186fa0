pub mod candies;
pub mod health;
pub mod images;
pub mod locations;
pub mod users;
