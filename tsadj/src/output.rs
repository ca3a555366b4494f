use adjust_panel::{ErrorReport, PanelView};

pub fn print_info(message: &str) {
    println!("[TSADJ][INFO] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[TSADJ][ERROR]: {message}");
}

pub fn print_report(step: &str, report: &ErrorReport) {
    print_error(&format!("{step} failed with code {}", report.code));
    for line in report.message.lines() {
        eprintln!("\t{line}");
    }
}

pub fn print_view(view: &PanelView) {
    if !view.visible {
        return;
    }
    println!("+-- {} --", view.title);
    println!(
        "|  value: {} {}  [{:?}]",
        view.indicator.value, view.unit, view.status
    );
    println!("|  {}    {}", view.lower_label, view.upper_label);
    println!("+-- [{}]", view.button_label);
}
