pub mod box_renderer;
