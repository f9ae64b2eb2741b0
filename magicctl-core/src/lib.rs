pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod local;
pub mod model;
pub mod notice;
pub mod query;
pub mod selection;
pub mod view;

pub use config::{BackendConfig, ListConfig, MagicConfig};
pub use error::{ListError, Result};
pub use filter::FilterInput;
pub use gateway::{MockGateway, RemoteGateway};
pub use local::filter_local;
pub use model::{Affected, Count, Entry, Filter, Page, Row, SocketUser, User, UserRole};
pub use notice::{Notice, NoticeLevel};
pub use query::{QueryCoordinator, QueryTicket};
pub use selection::{RowState, SelectionTracker};
pub use view::{DialogOutcome, EditKind, ListSettings, ListView, Update};
