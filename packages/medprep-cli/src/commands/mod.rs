pub mod ecg;
pub mod organize;
pub mod resize;
pub mod run;
pub mod split;
