//! Graph-traversal demo application (§1, §4.8): computes the N-degree collaborator closure of a
//! seed user over a projects/users/commits dataset, propagating deltas between nodes at each
//! degree. Grounded on the original source's `tests/client/linus_demo.cpp` ("Linus").

mod set;
mod tagger;

use std::sync::Arc;

use clap::Parser;
use eau2_demo_sorer::SorFile;
use eau2_frame::DistributedDataFrame;
use eau2_kv::KvStore;
use eau2_node::Node;
use eau2_value::{CellType, CellValue, Key};
use tracing::info;
use tracing_subscriber::EnvFilter;

use set::{Set, SetUpdater, SetWriter};
use tagger::{ProjectsTagger, UsersTagger};

#[derive(Parser, Debug)]
#[command(name = "eau2-graph-traversal")]
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

    #[arg(long, env = "EAU2_NUM_NODES")]
    num_nodes: usize,

    /// How many degrees of separation from the seed user to explore.
    #[arg(long, default_value_t = 3)]
    degrees: usize,

    /// Row offset of the seed user in the users file.
    #[arg(long, default_value_t = 0)]
    seed_user: i32,

    /// Sorer file of `pid x name` rows. Only consulted on node 0.
    #[arg(long)]
    projects: Option<String>,

    /// Sorer file of `uid x name` rows. Only consulted on node 0.
    #[arg(long)]
    users: Option<String>,

    /// Sorer file of `pid x uid x uid` commit rows. Only consulted on node 0.
    #[arg(long)]
    commits: Option<String>,

    /// How often to poll a remote key while blocked in `wait_and_read`.
    #[arg(long, env = "EAU2_POLL_INTERVAL_MS", default_value_t = 100)]
    poll_interval_ms: u64,

    #[arg(long, env = "EAU2_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn mk_key(name: &str, stage: usize, node_id: usize) -> anyhow::Result<Key> {
    Ok(Key::new(format!("{name}-{stage}-{node_id}"), node_id)?)
}

/// Gathers every other node's delta for `name` at `stage` into `set`, publishes the merged
/// result from node 0, and has every node (including node 0) fold the merged result back in, so
/// all nodes leave with an identical delta (grounded on `Linus::merge`).
fn merge(
    node_id: usize,
    n_nodes: usize,
    kv: Arc<KvStore>,
    name: &str,
    stage: usize,
    set: &mut Set,
) -> anyhow::Result<()> {
    if node_id == 0 {
        for i in 1..n_nodes {
            let key = mk_key(name, stage, i)?;
            let delta_frame = DistributedDataFrame::wait_and_read(&key, kv.clone(), n_nodes)?;
            let mut upd = SetUpdater { set: Set::new(set.len()) };
            delta_frame.map(&mut upd)?;
            set.union_(&upd.set);
        }
        let key0 = mk_key(name, stage, 0)?;
        let mut writer = SetWriter::new(set);
        DistributedDataFrame::from_writer(vec![CellType::I32], &mut writer, kv.clone(), n_nodes, &key0)?;
    } else {
        let key_mine = mk_key(name, stage, node_id)?;
        let mut writer = SetWriter::new(set);
        DistributedDataFrame::from_writer(vec![CellType::I32], &mut writer, kv.clone(), n_nodes, &key_mine)?;

        let key0 = mk_key(name, stage, 0)?;
        let merged = DistributedDataFrame::wait_and_read(&key0, kv.clone(), n_nodes)?;
        let mut upd = SetUpdater { set: Set::new(set.len()) };
        merged.map(&mut upd)?;
        set.union_(&upd.set);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn step(
    stage: usize,
    node_id: usize,
    n_nodes: usize,
    kv: Arc<KvStore>,
    users: &DistributedDataFrame,
    projects: &DistributedDataFrame,
    commits: &DistributedDataFrame,
    u_set: &mut Set,
    p_set: &mut Set,
) -> anyhow::Result<()> {
    let new_users_key = mk_key("users", stage, 0)?;
    let new_users_frame = DistributedDataFrame::wait_and_read(&new_users_key, kv.clone(), n_nodes)?;
    let mut delta_updater = SetUpdater { set: Set::new(users.n_rows()) };
    new_users_frame.map(&mut delta_updater)?;

    let mut ptagger = ProjectsTagger {
        u_set: delta_updater.set,
        p_set: p_set.clone(),
        new_projects: Set::new(projects.n_rows()),
    };
    commits.local_map(&mut ptagger)?;
    merge(node_id, n_nodes, kv.clone(), "projects", stage, &mut ptagger.new_projects)?;
    p_set.union_(&ptagger.new_projects);

    let mut utagger = UsersTagger {
        p_set: ptagger.new_projects,
        u_set: u_set.clone(),
        new_users: Set::new(users.n_rows()),
    };
    commits.local_map(&mut utagger)?;
    merge(node_id, n_nodes, kv.clone(), "users", stage + 1, &mut utagger.new_users)?;
    u_set.union_(&utagger.new_users);

    info!(stage, tagged_projects = p_set.num_true(), tagged_users = u_set.num_true(), "finished stage");
    Ok(())
}

fn read_input(
    options: &Options,
    kv: Arc<KvStore>,
    n_nodes: usize,
) -> anyhow::Result<(DistributedDataFrame, DistributedDataFrame, DistributedDataFrame)> {
    let proj_key = Key::new("projs", 0)?;
    let users_key = Key::new("usrs", 0)?;
    let commits_key = Key::new("comts", 0)?;

    if options.node_id == 0 {
        let projects_path = options.projects.as_ref().expect("checked in main");
        let users_path = options.users.as_ref().expect("checked in main");
        let commits_path = options.commits.as_ref().expect("checked in main");

        info!("node 0 reading projects/users/commits files");
        SorFile::load(projects_path)?.into_frame(kv.clone(), n_nodes, &proj_key)?;
        SorFile::load(users_path)?.into_frame(kv.clone(), n_nodes, &users_key)?;
        SorFile::load(commits_path)?.into_frame(kv.clone(), n_nodes, &commits_key)?;

        let initial_key = mk_key("users", 0, 0)?;
        DistributedDataFrame::from_scalar(CellValue::I32(options.seed_user), kv.clone(), n_nodes, &initial_key)?;
    }

    let projects = DistributedDataFrame::wait_and_read(&proj_key, kv.clone(), n_nodes)?;
    let users = DistributedDataFrame::wait_and_read(&users_key, kv.clone(), n_nodes)?;
    let commits = DistributedDataFrame::wait_and_read(&commits_key, kv, n_nodes)?;
    info!(projects = projects.n_rows(), users = users.n_rows(), commits = commits.n_rows(), "loaded input");
    Ok((projects, users, commits))
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&options.log_level))
        .init();

    if options.node_id == 0 && (options.projects.is_none() || options.users.is_none() || options.commits.is_none()) {
        anyhow::bail!("node 0 must be given --projects, --users, and --commits");
    }

    let kv = KvStore::with_poll_interval(
        options.node_id,
        std::time::Duration::from_millis(options.poll_interval_ms),
    );
    let node = Node::bootstrap(
        options.node_id,
        options.node_ip.clone(),
        options.node_port,
        options.master_ip.clone(),
        options.master_port,
        kv.clone(),
    )?;
    kv.attach_node(node.clone());

    let n_nodes = options.num_nodes;
    let (projects, users, commits) = read_input(&options, kv.clone(), n_nodes)?;

    let mut u_set = Set::new(users.n_rows());
    let mut p_set = Set::new(projects.n_rows());

    for stage in 0..options.degrees {
        step(stage, options.node_id, n_nodes, kv.clone(), &users, &projects, &commits, &mut u_set, &mut p_set)?;
    }

    if options.node_id == 0 {
        println!("tagged projects: {}", p_set.num_true());
        println!("tagged users: {}", u_set.num_true());
    }

    Ok(())
}
