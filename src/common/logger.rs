use csv::Writer;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// Logger for run records, e.g. per-episode statistics
pub trait Logger {
    // log a piece of data
    fn log(&mut self, data: LogItem);

    // dump all logged data
    fn dump(&self) -> Result<(), Box<dyn Error>>;

    // check whether logging is possible. if try_to_fix, then
    // the Logger will try to resolve the issue, e.g. by
    // creating the dir
    fn check_can_log(&self, try_to_fix: bool) -> Result<(), &str>;

    fn print_last(&self);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogData {
    String(String),
    Float(f32),
    Int(i32),
}

impl LogData {
    fn to_cell(&self) -> String {
        match self {
            LogData::String(s) => s.clone(),
            LogData::Float(f) => f.to_string(),
            LogData::Int(i) => i.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogItem {
    items: HashMap<String, LogData>,
}

impl LogItem {
    pub fn push(mut self, k: String, v: LogData) -> Self {
        self.items.insert(k, v);

        self
    }

    pub fn get(&self, k: &str) -> Option<&LogData> {
        self.items.get(k)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn combine(&mut self, other: LogItem) {
        self.items.extend(other.items);
    }
}

/// Keeps records in memory and optionally echoes them to stdout.
/// Nothing is written anywhere on `dump`.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    to_stdout: bool,
    data: Vec<LogItem>,
}

impl MemoryLogger {
    pub fn new(to_stdout: bool) -> Self {
        Self {
            to_stdout,
            data: Vec::new(),
        }
    }

    pub fn records(&self) -> &[LogItem] {
        &self.data
    }
}

impl Logger for MemoryLogger {
    fn log(&mut self, data: LogItem) {
        if data.is_empty() {
            return;
        }

        if self.to_stdout {
            println!("{:?}", data);
        }

        self.data.push(data);
    }

    fn dump(&self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    fn check_can_log(&self, _try_to_fix: bool) -> Result<(), &str> {
        Ok(())
    }

    fn print_last(&self) {
        print_item(self.data.last());
    }
}

pub struct CsvLogger {
    overwrite: bool,
    dump_path: PathBuf,
    to_stdout: bool,
    data: Vec<LogItem>,
}

impl CsvLogger {
    pub fn new(dump_path: PathBuf, to_stdout: bool, overwrite: bool) -> Self {
        Self {
            dump_path,
            to_stdout,
            data: Vec::new(),
            overwrite,
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.dump_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl Logger for CsvLogger {
    fn log(&mut self, data: LogItem) {
        if data.is_empty() {
            return;
        }

        if self.to_stdout {
            println!("{:?}", data);
        }

        self.data.push(data);
    }

    fn dump(&self) -> Result<(), Box<dyn Error>> {
        tracing::info!(
            "Dumping logs to {:?}. {} items to dump",
            self.dump_path,
            self.data.len()
        );

        let mut wtr = Writer::from_path(&self.dump_path)?;

        // union of all keys, sorted so the column order is stable
        let headers: Vec<String> = self
            .data
            .iter()
            .flat_map(|record| record.items.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        wtr.write_record(&headers)?;

        for record in &self.data {
            let row: Vec<String> = headers
                .iter()
                .map(|key| record.get(key).map(LogData::to_cell).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }

        wtr.flush()?;

        Ok(())
    }

    fn check_can_log(&self, try_to_fix: bool) -> Result<(), &str> {
        if self.dump_path.exists() && !self.overwrite {
            Err("logger dump file already exists")
        } else if self.dump_path.extension() != Some(OsStr::new("csv")) {
            Err("logger dump path should be a csv")
        } else if !self.parent_dir().exists() {
            // the parent directory does not exist
            if try_to_fix {
                match std::fs::create_dir_all(self.parent_dir()) {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Couldn't create directory"),
                }
            } else {
                Err("logger dump path dir does not exist")
            }
        } else {
            Ok(())
        }
    }

    fn print_last(&self) {
        print_item(self.data.last());
    }
}

fn print_item(item: Option<&LogItem>) {
    println!("Last Log:");
    if let Some(log) = item {
        let mut keys: Vec<&String> = log.items.keys().collect();
        keys.sort();
        for key in keys {
            println!("\t{key}: {:?}", log.items[key]);
        }
    }
}

#[cfg(test)]
mod test {
    use std::{env, fs, path::PathBuf};

    use super::{CsvLogger, LogData, LogItem, Logger, MemoryLogger};

    #[test]
    fn test_should_log() {
        let mut pth = env::temp_dir();
        pth.push("random_play_should_log.csv");
        let logger = CsvLogger::new(pth, false, true);
        let can_check = logger.check_can_log(false);

        assert_eq!(can_check, Ok(()));
    }

    #[test]
    fn test_shouldnt_log1() {
        let logger = CsvLogger::new(PathBuf::from("this/path/shouldnt/exist.csv"), false, true);
        let can_check = logger.check_can_log(false);

        assert_eq!(can_check, Err("logger dump path dir does not exist"));
    }

    #[test]
    fn test_shouldnt_log2() {
        let mut pth = env::temp_dir();
        pth.push("log.txt");
        let logger = CsvLogger::new(pth, false, true);
        let can_check = logger.check_can_log(false);

        assert_eq!(can_check, Err("logger dump path should be a csv"));
    }

    #[test]
    fn test_dump_writes_union_of_keys() {
        let mut pth = env::temp_dir();
        pth.push("random_play_dump_test.csv");

        let mut logger = CsvLogger::new(pth.clone(), false, true);
        logger.log(
            LogItem::default()
                .push("ep_num".to_string(), LogData::Int(0))
                .push("ep_reward".to_string(), LogData::Float(1.5)),
        );
        logger.log(LogItem::default());
        logger
            .log(LogItem::default().push("stage".to_string(), LogData::String("1-1".to_string())));

        logger.dump().unwrap();

        let written = fs::read_to_string(&pth).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["ep_num,ep_reward,stage", "0,1.5,", ",,1-1"]);

        let _ = fs::remove_file(pth);
    }

    #[test]
    fn test_memory_logger_skips_empty() {
        let mut logger = MemoryLogger::new(false);
        logger.log(LogItem::default());
        logger.log(LogItem::default().push("a".to_string(), LogData::Int(1)));

        assert_eq!(logger.records().len(), 1);
        assert_eq!(logger.records()[0].get("a"), Some(&LogData::Int(1)));
    }

    #[test]
    fn test_combine() {
        let mut a = LogItem::default().push("a".to_string(), LogData::Int(1));
        a.combine(LogItem::default().push("b".to_string(), LogData::Float(2.0)));

        assert_eq!(a.get("a"), Some(&LogData::Int(1)));
        assert_eq!(a.get("b"), Some(&LogData::Float(2.0)));
    }
}
