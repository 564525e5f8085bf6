mod decode_input;
mod format_output_name;
