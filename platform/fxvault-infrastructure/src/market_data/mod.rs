pub mod histdata;
