pub mod purchase_writer;
