use event_insights::AnalysisError;

fn main() {
    if let Err(err) = event_insights::run() {
        eprintln!("error: {err:#}");
        let user_error = err
            .downcast_ref::<AnalysisError>()
            .is_some_and(AnalysisError::is_user_error);
        std::process::exit(if user_error { 2 } else { 1 });
    }
}
