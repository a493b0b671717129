mod doctor;
mod run;

pub use doctor::doctor;
pub use run::run;

const GHOSTSCRIPT: &str = if cfg!(target_os = "windows") {
    "gswin64c.exe"
} else {
    "gs"
};
