pub mod club;
pub mod genre;
pub mod movie;
pub mod post;
pub mod rating;
pub mod role;
pub mod room;
pub mod user;

pub use club::{Club, ClubSummary, ClubView};
pub use genre::Genre;
pub use movie::{Movie, MovieSummary, MovieView};
pub use post::{Post, PostView};
pub use rating::{Rating, RatingView};
pub use role::Role;
pub use room::{ScreeningRoom, ScreeningRoomView};
pub use user::{User, UserProfile, UserSummary};
