pub mod block;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod service;

pub use block::{BlockState, DEFAULT_BLOCK_DAYS};
pub use models::{FinishRequest, Location, NewTrip, RequestStatus, StartRequest, Trip, TripStatus};
pub use repository::{DispatchRepository, TripFilter};
pub use service::{DispatchService, StartRequestStanding};
