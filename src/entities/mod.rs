pub mod battery;
pub mod capture;
pub mod node;
pub mod paddock;
pub mod reading;
pub mod user;

pub use battery::Entity as Battery;
pub use capture::Entity as Capture;
pub use node::Entity as Node;
pub use paddock::Entity as Paddock;
pub use reading::Entity as Reading;
pub use user::Entity as User;

pub mod prelude;
