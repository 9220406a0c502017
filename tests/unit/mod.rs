mod envelope_compile;
