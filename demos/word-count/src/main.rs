//! Word-count demo application (§1, §4.8): node 0 loads a sorer file into a distributed data
//! frame, every node counts the words in its locally-homed chunks, and node 0 reduces the
//! per-node partial counts into a final tally. Grounded on the original source's
//! `tests/client/word_count_demo.cpp`.

use std::collections::HashMap;

use clap::Parser;
use eau2_demo_sorer::SorFile;
use eau2_frame::{DistributedDataFrame, Rower};
use eau2_kv::KvStore;
use eau2_node::Node;
use eau2_value::{CellType, CellValue, Key, Row};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Counts string-column occurrences across the rows a `local_map` pass hands it.
struct WordCounter {
    counts: HashMap<String, i32>,
}

impl Rower for WordCounter {
    fn accept(&mut self, row: &mut Row) -> bool {
        let word = row.get_string(0).to_string();
        *self.counts.entry(word).or_insert(0) += 1;
        false
    }

    fn clone_for_fork(&self) -> Self {
        WordCounter { counts: HashMap::new() }
    }

    fn join(&mut self, other: Self) {
        for (word, count) in other.counts {
            *self.counts.entry(word).or_insert(0) += count;
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "eau2-word-count")]
struct Options {
    #[arg(long, env = "EAU2_NODE_ID")]
    node_id: usize,

    #[arg(long, env = "EAU2_NODE_IP", default_value = "127.0.0.1")]
    node_ip: String,

    #[arg(long, env = "EAU2_NODE_PORT")]
    node_port: u16,

    #[arg(long, env = "EAU2_MASTER_IP", default_value = "127.0.0.1")]
    master_ip: String,

    #[arg(long, env = "EAU2_MASTER_PORT", default_value_t = 9000)]
    master_port: u16,

    /// Size of the cluster every node agrees on up front; chunk/key routing depends on it.
    #[arg(long, env = "EAU2_NUM_NODES")]
    num_nodes: usize,

    /// Sorer file to load. Only consulted on node 0, which distributes the data.
    #[arg(long)]
    input: Option<String>,

    /// How often to poll a remote key while blocked in `wait_and_read`.
    #[arg(long, env = "EAU2_POLL_INTERVAL_MS", default_value_t = 100)]
    poll_interval_ms: u64,

    #[arg(long, env = "EAU2_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn partial_key(node_id: usize) -> anyhow::Result<Key> {
    Ok(Key::new(format!("wc-result-{node_id}"), node_id)?)
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&options.log_level))
        .init();

    if options.node_id == 0 && options.input.is_none() {
        anyhow::bail!("node 0 must be given --input, the sorer file to distribute");
    }

    let kv = KvStore::with_poll_interval(
        options.node_id,
        std::time::Duration::from_millis(options.poll_interval_ms),
    );
    let node = Node::bootstrap(
        options.node_id,
        options.node_ip,
        options.node_port,
        options.master_ip,
        options.master_port,
        kv.clone(),
    )?;
    kv.attach_node(node.clone());

    let n_nodes = options.num_nodes;
    let data_key = Key::new("wc-data", 0)?;

    if options.node_id == 0 {
        let path = options.input.expect("checked above");
        info!(path, "node 0 loading sorer file");
        let file = SorFile::load(&path)?;
        file.into_frame(kv.clone(), n_nodes, &data_key)?;
    }

    let words = DistributedDataFrame::wait_and_read(&data_key, kv.clone(), n_nodes)?;
    info!(rows = words.n_rows(), cols = words.n_cols(), "fetched main data frame");

    let mut counter = WordCounter { counts: HashMap::new() };
    words.local_map(&mut counter)?;
    info!(distinct_words = counter.counts.len(), "finished local word count");

    let mut partial = DistributedDataFrame::empty(vec![CellType::Str, CellType::I32], kv.clone(), n_nodes)?;
    for (word, count) in &counter.counts {
        let mut row = Row::from_types(&[CellType::Str, CellType::I32]);
        row.set(0, CellValue::Str(word.clone()));
        row.set(1, CellValue::I32(*count));
        partial.add_row(&row)?;
    }
    partial.publish(&partial_key(options.node_id)?)?;

    if options.node_id == 0 {
        let mut totals: HashMap<String, i32> = HashMap::new();
        for idx in 0..n_nodes {
            let part = DistributedDataFrame::wait_and_read(&partial_key(idx)?, kv.clone(), n_nodes)?;
            for r in 0..part.n_rows() {
                let word = part.get(0, r)?.value().as_str().unwrap_or_default().to_string();
                let count = part.get(1, r)?.value().as_i32().unwrap_or(0);
                *totals.entry(word).or_insert(0) += count;
            }
        }
        let mut entries: Vec<(String, i32)> = totals.into_iter().collect();
        entries.sort();
        for (word, count) in entries {
            println!("{word}: {count}");
        }
    }

    Ok(())
}
