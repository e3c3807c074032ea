pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_BATCH_DELAY_MS: u32 = 1;
pub const INDEX_FEED_PATH: &str = "/replays/index/json";
pub const FEED_SUFFIX: &str = "json";
pub const LOAD_FAILURE_MESSAGE: &str = "Failed to load replays";
pub const ALL_SENTINEL: &str = "All";
pub const TABLE_BODY_ID: &str = "replay-table-body";
pub const FEED_URL_META: &str = "meta[name=\"replay-feed-url\"]";
pub const SHOW_GAME_COLUMN_FLAG: &str = "showGameColumn";
pub const SHOW_ROUTE_COLUMN_FLAG: &str = "showRouteColumn";
pub const NOWRAP_CLASS: &str = "nowrap";
pub const COMMENT_CLASS: &str = "comment-cell";
