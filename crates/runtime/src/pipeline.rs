//! Runs the top-products pipeline on the configured engine.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use differential_dataflow::consolidation::consolidate;
use differential_dataflow::input::InputSession;
use timely::dataflow::operators::probe::Handle as ProbeHandle;
use tracing::info;

use cl_core::config::{Engine, PipelineConfig};
use cl_core::sales::{Product, ProductClass, RankedProduct, TopProduct, Transaction};
use cl_datasets::Dataset;
use cl_views::{
    aggregate_collection, aggregate_products, finalize, top_k_by_class, top_products,
    value_transactions, valued_collection, TopKConfig,
};

use crate::metrics::{MetricsRegistry, MetricsSnapshot, StageTimer};
use crate::start_runtime;

#[derive(Debug, Clone)]
pub struct Report {
    /// Rows in report order: class name, then rank.
    pub rows: Vec<TopProduct>,
    pub metrics: MetricsSnapshot,
    pub elapsed: Duration,
}

pub fn run(dataset: &Dataset, cfg: &PipelineConfig) -> Result<Report> {
    cfg.validate()?;
    dataset.validate()?;
    info!(engine = %cfg.engine, top_k = cfg.top_k, workers = cfg.workers, "pipeline starting");

    let timer = StageTimer::start();
    let metrics = MetricsRegistry::default();
    metrics.inc_transactions_loaded(dataset.transactions.len() as u64);

    let top_k = TopKConfig { k: cfg.top_k };
    let rows = match cfg.engine {
        Engine::Batch => run_batch(dataset, top_k, &metrics),
        Engine::Dataflow => run_dataflow(dataset, top_k, cfg.workers, &metrics)?,
    };
    metrics.inc_output_rows(rows.len() as u64);

    let elapsed = timer.elapsed();
    let snapshot = metrics.snapshot();
    info!(metrics = %snapshot.to_json_line("pipeline", Some(elapsed)), "pipeline finished");

    Ok(Report { rows, metrics: snapshot, elapsed })
}

fn run_batch(dataset: &Dataset, top_k: TopKConfig, metrics: &MetricsRegistry) -> Vec<TopProduct> {
    let valued = value_transactions(&dataset.transactions, &dataset.products, &dataset.product_classes);
    metrics.inc_transactions_valued(valued.len() as u64);

    let aggregates = aggregate_products(&valued);
    metrics.inc_aggregates(aggregates.len() as u64);

    top_products(aggregates, top_k)
}

fn run_dataflow(
    dataset: &Dataset,
    top_k: TopKConfig,
    workers: usize,
    metrics: &MetricsRegistry,
) -> Result<Vec<TopProduct>> {
    let dataset = Arc::new(dataset.clone());
    let registry = metrics.clone();

    let per_worker = start_runtime(workers, move |worker| {
        let mut transactions: InputSession<u64, Transaction, isize> = InputSession::new();
        let mut products: InputSession<u64, Product, isize> = InputSession::new();
        let mut classes: InputSession<u64, ProductClass, isize> = InputSession::new();
        let mut probe = ProbeHandle::new();

        let captured: Rc<RefCell<Vec<(RankedProduct, isize)>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&captured);
        let counters = registry.clone();

        worker.dataflow::<u64, _, _>(|scope| {
            let transactions = transactions.to_collection(scope);
            let products = products.to_collection(scope);
            let classes = classes.to_collection(scope);

            let valued_counter = counters.clone();
            let valued = valued_collection(&transactions, &products, &classes)
                .inspect(move |(_row, _time, diff)| {
                    valued_counter.inc_transactions_valued(u64::try_from(*diff).unwrap_or(0));
                });

            let aggregate_counter = counters.clone();
            let aggregates = aggregate_collection(&valued).inspect(move |(_row, _time, diff)| {
                aggregate_counter.inc_aggregates(u64::try_from(*diff).unwrap_or(0));
            });

            top_k_by_class(&aggregates, top_k)
                .inspect(move |(row, _time, diff)| sink.borrow_mut().push((row.clone(), *diff)))
                .probe_with(&mut probe);
        });

        // worker 0 feeds the whole dataset; the exchange spreads it
        if worker.index() == 0 {
            for txn in &dataset.transactions {
                transactions.insert(txn.clone());
            }
            for product in &dataset.products {
                products.insert(product.clone());
            }
            for class in &dataset.product_classes {
                classes.insert(class.clone());
            }
        }

        transactions.advance_to(1);
        products.advance_to(1);
        classes.advance_to(1);
        transactions.flush();
        products.flush();
        classes.flush();
        while probe.less_than(transactions.time()) {
            worker.step();
        }

        let rows = captured.borrow().clone();
        rows
    })?;

    let mut ranked: Vec<(RankedProduct, isize)> = per_worker.into_iter().flatten().collect();
    consolidate(&mut ranked);
    let ranked = ranked
        .into_iter()
        .filter(|(_row, diff)| *diff > 0)
        .map(|(row, _diff)| row)
        .collect();

    Ok(finalize(ranked))
}
