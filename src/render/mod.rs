pub mod pptx;
