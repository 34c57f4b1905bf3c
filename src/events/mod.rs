mod event_key;
mod events_service;
mod message_blocks;


pub use event_key::{convert_to_event_key, EventKey};
pub use events_service::{EventsService, ResolvedEntity};
pub use message_blocks::{create_message_blocks, entry_url};
