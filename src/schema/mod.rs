mod pause_record;
mod pause_type;
mod team;
mod user;

pub use pause_record::{
  ActivePause, HistoryEntry, PauseFilter, PauseRecord, PauseStatus, TeamPauseRow,
};
pub use pause_type::{PauseType, UpdatePauseType};
pub use team::Team;
pub use user::{InsertUser, UpdateUser, User, UserView};
