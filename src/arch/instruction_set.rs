/// One method per CHIP-8 instruction. Each method reads its operands
/// from the opcode currently being executed.
pub trait InstructionSet {
    // Flow control
    fn sys(&mut self);
    fn call(&mut self);
    fn r#return(&mut self);
    fn jump(&mut self);
    fn jump_with_offset(&mut self);

    // Conditional skips
    fn skip_if_eq_literal(&mut self);
    fn skip_if_ne_literal(&mut self);
    fn skip_if_eq_reg(&mut self);
    fn skip_if_ne_reg(&mut self);
    fn skip_if_key_pressed(&mut self);
    fn skip_if_key_not_pressed(&mut self);

    // Manipulating data registers
    fn set_reg_to_literal(&mut self);
    fn set_reg_to_reg(&mut self);
    fn set_reg_to_random(&mut self);

    fn add(&mut self);
    fn add_with_carry(&mut self);
    fn or(&mut self);
    fn and(&mut self);
    fn xor(&mut self);
    fn sub_x_from_y(&mut self);
    fn sub_y_from_x(&mut self);
    fn shift_right(&mut self);
    fn shift_left(&mut self);

    // Index register and memory
    fn set_index(&mut self);
    fn add_to_index(&mut self);
    fn set_index_to_font(&mut self);
    fn store_bcd(&mut self);
    fn save_registers(&mut self);
    fn restore_registers(&mut self);

    // Timers
    fn get_delay_timer(&mut self);
    fn set_delay_timer(&mut self);
    fn set_sound_timer(&mut self);

    // Display and input
    fn clear_screen(&mut self);
    fn draw_sprite(&mut self);
    /// Returns false if no key is pressed yet and the instruction must run again.
    fn wait_for_key(&mut self) -> bool;
}
