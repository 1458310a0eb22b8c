pub mod frame_buffer;
