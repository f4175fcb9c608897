use fibre_settings::{
  BoxError, CacheStore, Manager, SettingsBuilder, SettingsReader, SettingsResolver, SettingsWriter,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;

// A simulated settings table, counting how often it is queried.
#[derive(Default)]
struct Table {
  rows: Mutex<HashMap<String, String>>,
  queries: AtomicUsize,
}

impl SettingsReader for Table {
  fn try_get_value(&self, key: &str) -> Result<Option<String>, BoxError> {
    self.queries.fetch_add(1, Ordering::SeqCst);
    println!("--- Table: SELECT value WHERE key = '{}'", key);
    Ok(self.rows.lock().get(key).cloned())
  }

  fn get_all_values(&self) -> Result<HashMap<String, String>, BoxError> {
    self.queries.fetch_add(1, Ordering::SeqCst);
    println!("--- Table: SELECT *");
    Ok(self.rows.lock().clone())
  }
}

impl SettingsWriter for Table {
  fn set_value(&self, key: &str, value: &str) -> Result<(), BoxError> {
    println!("--- Table: UPSERT '{}' = '{}'", key, value);
    self.rows.lock().insert(key.to_owned(), value.to_owned());
    Ok(())
  }
}

// One table per dictionary.
#[derive(Default)]
struct Database {
  tables: Mutex<HashMap<String, Arc<Table>>>,
}

impl SettingsResolver for Database {
  type Source = Arc<Table>;

  fn try_resolve(&self, dictionary_name: &str) -> Result<Option<Self::Source>, BoxError> {
    Ok(self.tables.lock().get(dictionary_name).cloned())
  }

  fn create(&self, dictionary_name: &str) -> Result<Self::Source, BoxError> {
    println!("--- Database: CREATE TABLE '{}'", dictionary_name);
    let table = Arc::new(Table::default());
    self.tables.lock().insert(dictionary_name.to_owned(), table.clone());
    Ok(table)
  }
}

fn main() {
  let store = CacheStore::builder()
    .backend(fibre_settings::MemoryBackend::new())
    .default_timeout(Duration::from_secs(30))
    .build()
    .expect("Failed to build cache store");

  let builder = SettingsBuilder::new()
    .manager(Manager::new(Database::default()))
    .cache_store(Arc::new(store));

  let settings = builder
    .get_or_create_settings("mail")
    .expect("Failed to create settings");

  settings.set("smtp_host", "mail.example.com").unwrap();
  settings.set("smtp_port", "587").unwrap();

  println!("\nReading 'smtp_host' three times:");
  for _ in 0..3 {
    println!("smtp_host = {}", settings.get("smtp_host").unwrap());
  }

  println!("\nReading a missing key with a default:");
  println!("smtp_user = {}", settings.get_or("smtp_user", "anonymous").unwrap());

  println!("\nReading every setting twice:");
  for _ in 0..2 {
    let mut all: Vec<_> = settings.get_all().unwrap().into_iter().collect();
    all.sort();
    println!("{:?}", all);
  }

  println!("\nTable queries: {}", settings.source().queries.load(Ordering::SeqCst));
}
