/// Separator placed between the device name and a record name
pub const DEFAULT_SEPARATOR: &str = ":";
/// Worker threads of the coroutine scheduler when not configured
pub const DEFAULT_COROUTINE_WORKERS: usize = 2;
/// Seconds between autosave passes when not configured
pub const DEFAULT_SAVE_PERIOD_SECONDS: f64 = 30.0;
/// Byte capacity of a long string record given neither a length nor a value
pub const DEFAULT_LONG_STRING_LENGTH: usize = 256;
/// Most state names a multi-bit record can carry
pub const MAX_MBB_OPTIONS: usize = 16;
/// Extension of the primary autosave file
pub const AUTOSAVE_EXTENSION: &str = "softsav";
/// Extension of the file written before the primary is replaced
pub const AUTOSAVE_BACKUP_EXTENSION: &str = "softsavB";
/// `strftime` format of the suffix on restart backups
pub const AUTOSAVE_BACKUP_TIMESTAMP: &str = "%y%m%d-%H%M%S";
