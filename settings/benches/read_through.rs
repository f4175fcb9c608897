use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fibre_settings::{BoxError, CacheMode, CacheStore, Settings, SettingsReader, SettingsWriter};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// --- Backing store ---

struct StaticSource {
  entries: HashMap<String, String>,
}

impl StaticSource {
  fn new(size: usize) -> Self {
    Self {
      entries: (0..size).map(|i| (format!("key{}", i), format!("value{}", i))).collect(),
    }
  }
}

impl SettingsReader for StaticSource {
  fn try_get_value(&self, key: &str) -> Result<Option<String>, BoxError> {
    Ok(self.entries.get(key).cloned())
  }

  fn get_all_values(&self) -> Result<HashMap<String, String>, BoxError> {
    Ok(self.entries.clone())
  }
}

impl SettingsWriter for StaticSource {
  fn set_value(&self, _key: &str, _value: &str) -> Result<(), BoxError> {
    Ok(())
  }
}

fn settings(size: usize, cached: bool) -> Settings<StaticSource> {
  let mode = if cached {
    CacheMode::with_timeout(Arc::new(CacheStore::in_memory()), Duration::from_secs(600))
  } else {
    CacheMode::Disabled
  };
  Settings::with_cache("bench", StaticSource::new(size), mode).unwrap()
}

// --- Benchmarks ---

fn bench_get(c: &mut Criterion) {
  let mut group = c.benchmark_group("get");
  group.throughput(Throughput::Elements(1));

  for cached in [false, true] {
    let settings = settings(100, cached);
    settings.get("key42").unwrap();
    group.bench_with_input(BenchmarkId::new("cached", cached), &settings, |b, settings| {
      b.iter(|| black_box(settings.get(black_box("key42")).unwrap()))
    });
  }
  group.finish();
}

fn bench_get_all(c: &mut Criterion) {
  let mut group = c.benchmark_group("get_all");

  for size in [10usize, 100, 1_000] {
    let settings = settings(size, true);
    settings.get_all().unwrap();
    group.throughput(Throughput::Elements(size as u64));
    group.bench_with_input(BenchmarkId::from_parameter(size), &settings, |b, settings| {
      b.iter(|| black_box(settings.get_all().unwrap()))
    });
  }
  group.finish();
}

criterion_group!(benches, bench_get, bench_get_all);
criterion_main!(benches);
