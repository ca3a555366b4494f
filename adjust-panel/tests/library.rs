use adjust_panel::error::{
    TSPAN_ERR_NOT_A_BENCH, TSPAN_ERR_PANEL_NOT_DISPLAYED, TSPAN_ERR_THREAD_WAS_NOT_STARTED,
    TSPAN_ERR_WRONG_FORMAT_TYPE,
};
use adjust_panel::panel::{IndicatorFormat, DEMO_BUTTON, DEMO_TITLE, DEMO_VALUE};
use adjust_panel::record::lock_record;
use adjust_panel::{
    AdjustmentLibrary, BenchRecord, DisplayRequest, HeadlessDisplay, HeadlessLoader, PanelConfig,
    PanelLoader, PanelSessionManager, Released, StatusColor, StepStatus, ValueStatus,
};
use automation::{ObjHandle, Station};
use resmgr::{
    BenchConfig, InMemoryResourceManager, MemoryTraceSink, ResourceDefinition,
    GTSL_ERR_INVALID_RESOURCE_ID, GTSL_ERR_UNKNOWN_RESOURCE, GTSL_ERR_WRONG_RESOURCE_ID,
    KEY_DEMO_MODE, KEY_TRACE,
};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

struct Bench {
    station: Arc<Station>,
    resmgr: Arc<InMemoryResourceManager>,
    sink: Arc<MemoryTraceSink>,
    display: HeadlessDisplay,
    library: AdjustmentLibrary,
}

impl Bench {
    fn new() -> Self {
        let display = HeadlessDisplay::new();
        Self::with_loader(display.clone(), HeadlessLoader::new(display))
    }

    fn with_loader(display: HeadlessDisplay, loader: impl PanelLoader + 'static) -> Self {
        let config = BenchConfig {
            resources: vec![
                ResourceDefinition::bench("AdjustBench"),
                ResourceDefinition::bench("TracedBench").with_key(KEY_TRACE, "1"),
                ResourceDefinition::bench("DemoBench").with_key(KEY_DEMO_MODE, "1"),
                ResourceDefinition::device("Dmm"),
            ],
        };
        let sink = Arc::new(MemoryTraceSink::new());
        let resmgr = Arc::new(InMemoryResourceManager::new(config, sink.clone()));
        let station = Arc::new(Station::new());
        let panel_config = PanelConfig {
            startup_timeout_ms: 2_000,
            shutdown_warning_ms: 2_000,
            demo_delay_ms: 0,
            ..PanelConfig::default()
        };
        let sessions = Arc::new(PanelSessionManager::new(
            station.clone(),
            Arc::new(loader),
            panel_config,
        ));
        let library = AdjustmentLibrary::new(resmgr.clone(), sessions);
        Self {
            station,
            resmgr,
            sink,
            display,
            library,
        }
    }

    fn context(&self) -> ObjHandle {
        self.station.start_execution()
    }
}

fn request(format: &str) -> DisplayRequest<'_> {
    DisplayRequest {
        step_name: "Adjust reference voltage",
        button_text: "Accept",
        unit: "V",
        format,
        lower_limit: 1.0,
        upper_limit: 5.0,
    }
}

#[test]
fn single_caller_reports_in_and_out_of_range() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "AdjustBench").unwrap();

    bench.library.display(ctx, id, &request("%.2f")).unwrap();
    let view = bench.library.sessions().snapshot().unwrap();
    assert!(view.visible);
    assert_eq!(view.title, "Adjust reference voltage");
    assert_eq!(view.lower_label, "LL: 1.00 V");
    assert_eq!(view.upper_label, "UL: 5.00 V");
    assert_eq!(view.indicator.format, IndicatorFormat::FloatingPoint);
    assert_eq!(view.indicator.precision, 2);

    assert_eq!(
        bench.library.set_value(ctx, id, 3.0).unwrap(),
        ValueStatus::InRange
    );
    assert_eq!(
        bench.library.sessions().snapshot().unwrap().status,
        StatusColor::Green
    );
    assert_eq!(
        bench.library.set_value(ctx, id, 7.0).unwrap(),
        ValueStatus::OutOfRange
    );
    let view = bench.library.sessions().snapshot().unwrap();
    assert_eq!(view.status, StatusColor::Red);
    assert_eq!(view.indicator.value, 7.0);

    bench.library.hide(ctx, id).unwrap();
    bench.library.cleanup(ctx, id).unwrap();

    let sessions = bench.library.sessions();
    assert_eq!(sessions.live_use_count(), 0);
    assert_eq!(sessions.panel_handle(), None);
    assert_eq!(sessions.worker_thread_id(), None);
    assert_eq!(bench.station.live_handles(), 1);
    assert_eq!(bench.resmgr.allocated_count(), 0);
    assert_eq!(bench.display.snapshot().foreign_renders, 0);
}

#[test]
fn display_records_panel_and_thread_on_resource() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "AdjustBench").unwrap();
    bench.library.display(ctx, id, &request("%i")).unwrap();

    let record = BenchRecord::resolve(&*bench.resmgr, id).unwrap();
    {
        let record = lock_record(&record);
        assert_eq!(
            record.actual_panel_handle,
            bench.library.sessions().panel_handle()
        );
        assert_eq!(
            record.owner_thread_id,
            bench.library.sessions().worker_thread_id()
        );
    }

    let ctx_b = bench.context();
    let id_b = bench.library.setup(ctx_b, "AdjustBench").unwrap();
    bench.library.display(ctx_b, id_b, &request("%i")).unwrap();
    let joined = BenchRecord::resolve(&*bench.resmgr, id_b).unwrap();
    {
        let joined = lock_record(&joined);
        assert_eq!(
            joined.actual_panel_handle,
            bench.library.sessions().panel_handle()
        );
        assert_eq!(
            joined.owner_thread_id,
            bench.library.sessions().worker_thread_id()
        );
        assert!(joined.owner_thread_id.is_some());
    }
    bench.library.hide(ctx_b, id_b).unwrap();

    bench.library.hide(ctx, id).unwrap();
    let record = lock_record(&record);
    assert_eq!(record.actual_panel_handle, None);
    assert_eq!(record.owner_thread_id, None);
}

#[test]
fn two_callers_share_one_worker() {
    let bench = Bench::new();
    let ctx_a = bench.context();
    let ctx_b = bench.context();
    let id_a = bench.library.setup(ctx_a, "AdjustBench").unwrap();
    let id_b = bench.library.setup(ctx_b, "AdjustBench").unwrap();
    let barrier = Barrier::new(2);

    thread::scope(|scope| {
        let a = scope.spawn(|| {
            barrier.wait();
            bench.library.display(ctx_a, id_a, &request("%.1f"))
        });
        let b = scope.spawn(|| {
            barrier.wait();
            bench.library.display(ctx_b, id_b, &request("%.3f"))
        });
        a.join().unwrap().unwrap();
        b.join().unwrap().unwrap();
    });

    let sessions = bench.library.sessions();
    assert_eq!(sessions.stats().spawns, 1);
    assert_eq!(sessions.live_use_count(), 2);
    assert_eq!(bench.display.snapshot().loads, 1);

    bench.library.hide(ctx_a, id_a).unwrap();
    assert!(sessions.is_worker_alive());
    assert_eq!(sessions.live_use_count(), 1);
    assert_eq!(
        bench.library.set_value(ctx_b, id_b, 2.5).unwrap(),
        ValueStatus::InRange
    );

    bench.library.hide(ctx_b, id_b).unwrap();
    assert!(!sessions.is_worker_alive());
    assert_eq!(sessions.stats().joins, 1);
    assert_eq!(bench.station.live_handles(), 2);
}

#[test]
fn startup_failure_reports_thread_was_not_started() {
    let display = HeadlessDisplay::new();
    let bench = Bench::with_loader(
        display.clone(),
        HeadlessLoader::failing(display, "testadjustmentpanel.uir not found"),
    );
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "AdjustBench").unwrap();

    let start = Instant::now();
    let report = bench.library.display(ctx, id, &request("%.2f")).unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(report.code, TSPAN_ERR_THREAD_WAS_NOT_STARTED);
    assert_eq!(
        report.message,
        "Library: TSADJ\nBench: AdjustBench\nError: Thread was not started. Possible cause: UIR file was not found."
    );
    assert_eq!(bench.library.sessions().panel_handle(), None);
    assert_eq!(bench.library.sessions().live_use_count(), 0);

    let status = StepStatus::from(&bench.library.hide(ctx, id));
    assert!(!status.error_occurred);
}

#[test]
fn setup_rejects_devices_and_unknown_names() {
    let bench = Bench::new();
    let ctx = bench.context();

    let report = bench.library.setup(ctx, "Dmm").unwrap_err();
    assert_eq!(report.code, TSPAN_ERR_NOT_A_BENCH);
    assert!(report.message.contains("Bench: Dmm"));
    assert!(report.message.ends_with("The given resource is not a bench"));
    assert_eq!(bench.resmgr.allocated_count(), 0);

    let report = bench.library.setup(ctx, "Nowhere").unwrap_err();
    assert_eq!(report.code, GTSL_ERR_UNKNOWN_RESOURCE);
    assert!(!report.message.contains("Bench:"));
}

#[test]
fn corrupted_owner_fails_without_touching_the_count() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "AdjustBench").unwrap();
    let record = BenchRecord::resolve(&*bench.resmgr, id).unwrap();
    lock_record(&record).owner = 0;

    let report = bench.library.display(ctx, id, &request("%.2f")).unwrap_err();
    assert_eq!(report.code, GTSL_ERR_WRONG_RESOURCE_ID);
    assert_eq!(bench.library.sessions().live_use_count(), 0);
    assert_eq!(bench.library.sessions().stats().spawns, 0);

    assert_eq!(
        bench.library.hide(ctx, id).unwrap_err().code,
        GTSL_ERR_WRONG_RESOURCE_ID
    );
    assert_eq!(
        bench.library.cleanup(ctx, id).unwrap_err().code,
        GTSL_ERR_WRONG_RESOURCE_ID
    );
}

#[test]
fn unsupported_format_is_rejected_before_the_session_starts() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "AdjustBench").unwrap();

    let report = bench.library.display(ctx, id, &request("%s")).unwrap_err();
    assert_eq!(report.code, TSPAN_ERR_WRONG_FORMAT_TYPE);
    assert!(report.message.ends_with("Format type is not supported."));
    assert_eq!(bench.library.sessions().live_use_count(), 0);
}

#[test]
fn oversized_format_fields_are_rejected_before_the_session_starts() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "AdjustBench").unwrap();

    for format in ["%.70000f", "%70000f"] {
        let report = bench.library.display(ctx, id, &request(format)).unwrap_err();
        assert_eq!(report.code, TSPAN_ERR_WRONG_FORMAT_TYPE, "{format}");
        assert_eq!(bench.library.sessions().live_use_count(), 0);
        assert_eq!(bench.library.sessions().panel_handle(), None);
    }
    assert_eq!(bench.library.sessions().stats().spawns, 0);
}

#[test]
fn cleanup_while_live_frees_the_resource_but_keeps_the_session() {
    let bench = Bench::new();
    let ctx_a = bench.context();
    let ctx_b = bench.context();
    let id_a = bench.library.setup(ctx_a, "AdjustBench").unwrap();
    let id_b = bench.library.setup(ctx_b, "AdjustBench").unwrap();
    bench.library.display(ctx_a, id_a, &request("%.2f")).unwrap();
    bench.library.display(ctx_b, id_b, &request("%.2f")).unwrap();
    assert_eq!(bench.resmgr.allocated_count(), 2);

    bench.library.cleanup(ctx_a, id_a).unwrap();
    let sessions = bench.library.sessions();
    assert_eq!(bench.resmgr.allocated_count(), 1);
    assert_eq!(sessions.live_use_count(), 2);
    assert!(sessions.is_worker_alive());
    assert_eq!(
        bench.library.hide(ctx_a, id_a).unwrap_err().code,
        GTSL_ERR_INVALID_RESOURCE_ID
    );

    bench.library.hide(ctx_b, id_b).unwrap();
    assert_eq!(sessions.live_use_count(), 1);
    assert!(sessions.is_worker_alive());

    assert_eq!(sessions.release(), Released::Stopped);
    assert!(!sessions.is_worker_alive());
    assert_eq!(sessions.stats().joins, 1);
    bench.library.cleanup(ctx_b, id_b).unwrap();
    assert_eq!(bench.resmgr.allocated_count(), 0);
}

#[test]
fn set_value_without_display_fails() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "AdjustBench").unwrap();
    let report = bench.library.set_value(ctx, id, 1.0).unwrap_err();
    assert_eq!(report.code, TSPAN_ERR_PANEL_NOT_DISPLAYED);
}

#[test]
fn demo_mode_overrides_feedback() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "DemoBench").unwrap();
    bench.library.display(ctx, id, &request("%.2f")).unwrap();

    let view = bench.library.sessions().snapshot().unwrap();
    assert_eq!(view.title, DEMO_TITLE);
    assert_eq!(view.button_label, DEMO_BUTTON);

    assert_eq!(
        bench.library.set_value(ctx, id, 3.0).unwrap(),
        ValueStatus::Demo
    );
    let view = bench.library.sessions().snapshot().unwrap();
    assert_eq!(view.indicator.value, DEMO_VALUE);
    assert_eq!(view.status, StatusColor::Magenta);

    bench.library.hide(ctx, id).unwrap();
}

#[test]
fn long_button_text_is_shortened_on_the_panel() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "AdjustBench").unwrap();
    let request = DisplayRequest {
        button_text: "Value is adjusted",
        ..request("%.2f")
    };
    bench.library.display(ctx, id, &request).unwrap();
    assert_eq!(
        bench.library.sessions().snapshot().unwrap().button_label,
        "Value is ..."
    );
    bench.library.hide(ctx, id).unwrap();
}

#[test]
fn traced_bench_writes_begin_end_and_error_lines() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "TracedBench").unwrap();
    assert!(bench.sink.contains(">>TSADJ_Setup begin"));
    assert!(bench.sink.contains("-> Resource ID"));
    assert!(bench.sink.contains("<<TSADJ_Setup end"));

    let _ = bench.library.display(ctx, id, &request("%q"));
    assert!(bench.sink.contains(">>TSADJ_DisplayAdjustmentPanel begin"));
    assert!(bench
        .sink
        .contains(&format!("Error {TSPAN_ERR_WRONG_FORMAT_TYPE} : Library: TSADJ")));
    assert!(bench.sink.contains("<<TSADJ_DisplayAdjustmentPanel end"));

    bench.library.cleanup(ctx, id).unwrap();
    assert!(bench.sink.contains(&format!("Free Resource ID {id}")));
}

#[test]
fn untraced_bench_stays_silent() {
    let bench = Bench::new();
    let ctx = bench.context();
    let id = bench.library.setup(ctx, "AdjustBench").unwrap();
    bench.library.display(ctx, id, &request("%.2f")).unwrap();
    bench.library.hide(ctx, id).unwrap();
    bench.library.cleanup(ctx, id).unwrap();
    assert!(bench.sink.lines().is_empty());
}
