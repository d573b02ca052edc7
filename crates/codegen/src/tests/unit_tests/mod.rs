mod control_flow;
mod objects_and_arrays;
