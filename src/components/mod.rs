pub mod compare_view;
pub mod proof_viewer;
