pub(crate) mod downloads;
pub(crate) mod media;
pub(crate) mod watch;
pub(crate) mod watchlist;
