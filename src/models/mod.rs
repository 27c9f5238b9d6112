pub mod candidate;
pub mod courier;
pub mod order;
pub mod tenant;
pub mod zone;
